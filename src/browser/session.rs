use crate::{browser::{config::{ConnectionOptions, LaunchOptions}, url::normalize_url},
            error::{AgentError, Result},
            page::ChromePage};
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A task can idle on the planner for a long time; keep the browser alive for an hour
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| AgentError::Browser(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| AgentError::Browser(format!("Failed to create tab: {}", e)))?;

        log::info!("Launched browser (headless: {})", options.headless);
        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url.clone())
            .map_err(|e| AgentError::Browser(format!("Failed to connect to {}: {}", options.ws_url, e)))?;

        log::info!("Attached to browser at {}", options.ws_url);
        Ok(Self { browser })
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| AgentError::Browser(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // First pass: visible and focused
        for tab in &tabs {
            if Self::evaluates_true(tab, "document.visibilityState === 'visible' && document.hasFocus()") {
                return Ok(tab.clone());
            }
        }

        // Second pass: visible only
        for tab in &tabs {
            if Self::evaluates_true(tab, "document.visibilityState === 'visible'") {
                return Ok(tab.clone());
            }
        }

        // Headless tabs may report neither; fall back to the most recent one
        tabs.last()
            .cloned()
            .ok_or_else(|| AgentError::Browser("No active tab found".to_string()))
    }

    fn evaluates_true(tab: &Arc<Tab>, expression: &str) -> bool {
        match tab.evaluate(expression, false) {
            Ok(remote_object) => remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false),
            Err(e) => {
                log::debug!("Failed to check tab status: {}", e);
                false
            }
        }
    }

    /// Navigate the active tab and wait for the load to finish
    pub fn navigate(&self, url: &str) -> Result<()> {
        let url = normalize_url(url);
        let tab = self.get_active_tab()?;
        tab.navigate_to(&url)
            .map_err(|e| AgentError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| AgentError::Browser(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Page driver bound to the active tab
    pub fn active_page(&self) -> Result<ChromePage> {
        let tab = self.get_active_tab()?;
        tab.activate()
            .map_err(|e| AgentError::Browser(format!("Failed to activate tab: {}", e)))?;
        Ok(ChromePage::new(tab))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close every tab; the process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab: {}", e);
            }
        }
        Ok(())
    }
}
