mod common;

use common::{actions, run_to_end, statuses, FakeElement, FakePage, ScriptedPlanner};
use page_pilot::agent::{BUDGET_EXHAUSTED_ANSWER, TASK_BUSY_STATUS};
use page_pilot::dom::element::{MAX_ELEMENTS, MAX_TEXT_CHARS};
use page_pilot::error::AgentError;
use page_pilot::page::{ClickStrategy, DomEvent, Highlight};
use page_pilot::planner::{Decision, ScrollDirection};
use page_pilot::{AgentConfig, AgentRuntime, ExecutorTimings, Message, Outcome, StatusLevel};
use std::time::Duration;

fn start(page: &FakePage, planner: &ScriptedPlanner, config: AgentConfig) -> AgentRuntime {
    AgentRuntime::start(page.clone(), planner.clone(), config, ExecutorTimings::default())
}

fn finished(answer: &str) -> Message {
    Message::AgentFinished {
        answer: answer.to_string(),
    }
}

async fn assert_quiet(runtime: &mut AgentRuntime) {
    let next = tokio::time::timeout(Duration::from_secs(60), runtime.next()).await;
    assert!(next.is_err(), "unexpected message after task end: {:?}", next);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_finish() {
    let page = FakePage::new(vec![
        FakeElement::heading(1, "Welcome to the example shoe shop"),
        FakeElement::button(2, "Buy now"),
    ]);
    let planner = ScriptedPlanner::new(vec![
        Decision::finish("The shop sells shoes").with_thought("The heading answers it"),
    ]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("What does the shop sell?", "key-1").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert_eq!(messages.last(), Some(&finished("The shop sells shoes")));
    assert!(actions(&messages).is_empty());
    assert!(page.state().clicks.is_empty());
    assert_eq!(
        statuses(&messages),
        vec![
            "Starting agentic browsing...",
            "Goal: What does the shop sell?",
            "Observing page (action 1/20)...",
            "Thinking about next action...",
            "AI decision: The heading answers it",
        ]
    );

    let seen = planner.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].goal, "What does the shop sell?");
    assert_eq!(seen[0].api_key, "key-1");
    assert!(seen[0].history.is_empty());

    let catalog = &seen[0].catalog;
    assert_eq!(catalog.agent_ids().collect::<Vec<_>>(), vec!["agent-id-1"]);
    assert_eq!(catalog.elements[0].text.as_deref(), Some("Buy now"));
    let heading = &catalog.elements[1];
    assert!(heading.is_context);
    assert!(heading.agent_id.is_none());
    assert_eq!(page.state().stamps.get(&2).map(String::as_str), Some("agent-id-1"));

    assert_quiet(&mut runtime).await;
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_single_click() {
    let page = FakePage::new(vec![
        FakeElement::link(1, "Pricing", "/pricing"),
        FakeElement::button(2, "Sign in"),
    ]);
    page.on_click_navigate(
        1,
        vec![
            FakeElement::heading(10, "Plans start at $9 per month"),
            FakeElement::button(11, "Subscribe"),
        ],
    );
    let planner = ScriptedPlanner::new(vec![
        Decision::click("agent-id-1").with_thought("Open pricing"),
        Decision::finish("Plans start at $9"),
    ]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("How much is the cheapest plan?", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert_eq!(messages.last(), Some(&finished("Plans start at $9")));
    assert_eq!(actions(&messages), vec!["CLICK: Open pricing"]);
    assert!(messages.contains(&Message::status(
        "Action completed: CLICK completed successfully",
        StatusLevel::Success
    )));

    let state = page.state();
    assert_eq!(state.clicks, vec![(1, ClickStrategy::Native)]);
    assert_eq!(state.scrolled_into_view, vec![1]);
    assert_eq!(state.highlight_log, vec![(1, Highlight::Thinking), (1, Highlight::Acting)]);
    assert!(state.highlight.is_none());
    drop(state);

    let seen = planner.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].history, vec!["CLICK: Open pricing"]);
    let after = &seen[1].catalog;
    assert_eq!(after.agent_ids().collect::<Vec<_>>(), vec!["agent-id-1"]);
    assert_eq!(after.elements[0].text.as_deref(), Some("Subscribe"));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_type_and_submit() {
    let page = FakePage::new(vec![FakeElement::input(1, "q"), FakeElement::submit(2, "Search")]);
    let planner = ScriptedPlanner::new(vec![
        Decision::type_text("agent-id-1", "hello").with_thought("Fill the search box"),
        Decision::click("agent-id-2").with_thought("Submit"),
        Decision::finish("Searched"),
    ]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Search for hello", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert_eq!(messages.last(), Some(&finished("Searched")));
    assert_eq!(actions(&messages), vec!["TYPE: Fill the search box", "CLICK: Submit"]);

    assert_eq!(page.value(1).as_deref(), Some("hello"));
    let events = page.events(1);
    assert_eq!(events.iter().filter(|e| **e == DomEvent::Input).count(), 5);
    assert_eq!(&events[5..], &[DomEvent::Change, DomEvent::Blur]);
    assert_eq!(page.state().focused, Some(1));
    assert_eq!(page.state().clicks, vec![(2, ClickStrategy::Native)]);

    let seen = planner.seen();
    let typed = seen[1].catalog.find("agent-id-1").unwrap();
    assert_eq!(typed.value.as_deref(), Some("hello"));
    assert_eq!(seen[1].catalog.find("agent-id-2").unwrap().value.as_deref(), Some("Search"));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stale_binding_reports_and_continues() {
    let page = FakePage::new(vec![FakeElement::button(1, "Next")]);
    let planner = ScriptedPlanner::new(vec![
        Decision::click("agent-id-9").with_thought("Guess"),
        Decision::finish("Gave up"),
    ]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Go next", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    let failures: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m, Message::AgentStatusUpdate { level: StatusLevel::Error, .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(statuses(&messages)
        .iter()
        .any(|s| s.starts_with("Action failed: stale-binding")));
    assert_eq!(messages.last(), Some(&finished("Gave up")));
    assert!(page.state().clicks.is_empty());

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhaustion() {
    let page = FakePage::new(vec![FakeElement::button(1, "Refresh")]);
    let planner = ScriptedPlanner::repeating(Decision::wait(Some(100)).with_thought("Wait for results"));
    let mut runtime = start(&page, &planner, AgentConfig::new().budget(3));

    runtime.start_task("Wait forever", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert_eq!(actions(&messages).len(), 3);
    assert_eq!(planner.calls(), 3);
    assert_eq!(messages.last(), Some(&finished(BUDGET_EXHAUSTED_ANSWER)));
    assert!(statuses(&messages).contains(&"Observing page (action 3/3)...".to_string()));
    assert!(!statuses(&messages).contains(&"Observing page (action 4/3)...".to_string()));

    // every action is answered before the next one is issued
    let mut outstanding = false;
    for message in &messages {
        match message {
            Message::AgentAction { .. } => {
                assert!(!outstanding);
                outstanding = true;
            }
            Message::AgentStatusUpdate { status, .. } if status.starts_with("Action ") => outstanding = false,
            _ => {}
        }
    }

    assert_quiet(&mut runtime).await;
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_scroll_without_progress() {
    let page = FakePage::new(vec![FakeElement::button(1, "Load more")]);
    page.state().max_scroll = 0.0;
    let planner = ScriptedPlanner::new(vec![
        Decision::scroll(ScrollDirection::Down).with_thought("Look further"),
        Decision::finish("Nothing below"),
    ]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Find the footer", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert!(statuses(&messages)
        .iter()
        .any(|s| s.starts_with("Action failed: scroll-no-progress")));
    assert_eq!(messages.last(), Some(&finished("Nothing below")));
    assert_eq!(page.state().scroll_top, 0.0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_scroll_moves_page() {
    let page = FakePage::new(vec![FakeElement::button(1, "Load more")]);
    let planner = ScriptedPlanner::new(vec![Decision::scroll(ScrollDirection::Down), Decision::finish("done")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Scroll", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert!(messages.contains(&Message::status(
        "Action completed: SCROLL completed successfully",
        StatusLevel::Success
    )));
    assert_eq!(page.state().scroll_top, 640.0);
    assert_eq!(planner.seen()[1].catalog.page_context.viewport.scroll_top, 640.0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_click_unavailable_continues() {
    let page = FakePage::new(vec![FakeElement::button(1, "Broken")]);
    page.state().refuse_clicks = true;
    let planner = ScriptedPlanner::new(vec![Decision::click("agent-id-1"), Decision::finish("Could not click")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Click it", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert!(statuses(&messages)
        .iter()
        .any(|s| s.starts_with("Action failed: click-unavailable")));
    assert_eq!(messages.last(), Some(&finished("Could not click")));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_executed_ids_come_from_preceding_observation() {
    let page = FakePage::new(vec![
        FakeElement::heading(1, "Checkout in three steps"),
        FakeElement::link(2, "Cart", "/cart"),
        FakeElement::button(3, "Continue"),
    ]);
    page.on_click_navigate(
        3,
        vec![
            FakeElement::input(20, "email").at(100.0),
            FakeElement::input(21, "zip").at(150.0),
            FakeElement::button(22, "Pay").at(200.0),
        ],
    );
    let planner = ScriptedPlanner::new(vec![
        Decision::click("agent-id-2").with_thought("Continue"),
        Decision::type_text("agent-id-1", "a@b.c"),
        Decision::type_text("agent-id-2", "12345"),
        Decision::click("agent-id-3"),
        Decision::finish("Paid"),
    ]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Check out", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;
    assert_eq!(messages.last(), Some(&finished("Paid")));

    for seen in planner.seen() {
        let ids: Vec<_> = seen.catalog.agent_ids().map(str::to_string).collect();
        let expected: Vec<_> = (1..=ids.len()).map(|n| format!("agent-id-{}", n)).collect();
        assert_eq!(ids, expected);

        if let Some(target) = seen.decision.as_ref().and_then(|d| d.target_id.as_ref()) {
            assert!(ids.contains(target), "{} not in {:?}", target, ids);
        }
        for record in seen.catalog.elements.iter().filter(|r| r.is_context) {
            assert!(record.agent_id.is_none());
        }
    }

    assert_eq!(page.value(20).as_deref(), Some("a@b.c"));
    assert_eq!(page.value(21).as_deref(), Some("12345"));
    assert_eq!(page.state().clicks, vec![(3, ClickStrategy::Native), (22, ClickStrategy::Native)]);

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_catalog_is_capped() {
    let long = "x".repeat(400);
    let elements = (1..=90)
        .map(|n| FakeElement::button(n, &format!("{} {}", n, long)).at(10.0))
        .collect();
    let page = FakePage::new(elements);
    let planner = ScriptedPlanner::new(vec![Decision::finish("ok")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("Look", "key").unwrap();
    run_to_end(&mut runtime).await;

    let catalog = &planner.seen()[0].catalog;
    assert_eq!(catalog.elements.len(), MAX_ELEMENTS);
    assert!(catalog
        .elements
        .iter()
        .all(|r| r.text.as_ref().map_or(true, |t| t.chars().count() <= MAX_TEXT_CHARS)));
    assert_eq!(catalog.agent_ids().last(), Some("agent-id-60"));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_while_running_is_rejected() {
    let page = FakePage::new(vec![FakeElement::button(1, "Go")]);
    let planner = ScriptedPlanner::new(vec![Decision::finish("first done")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("first", "key").unwrap();
    runtime.start_task("second", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert!(messages.contains(&Message::status(TASK_BUSY_STATUS, StatusLevel::Error)));
    assert_eq!(messages.last(), Some(&finished("first done")));
    let seen = planner.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].goal, "first");

    assert_quiet(&mut runtime).await;
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_ignores_late_observation() {
    let page = FakePage::new(vec![FakeElement::button(1, "Go")]);
    let planner = ScriptedPlanner::new(vec![Decision::finish("second done")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("first", "key").unwrap();
    runtime.cancel().unwrap();

    loop {
        match runtime.next().await {
            Some(Message::AgentStatusUpdate { status, .. }) if status == "Task cancelled." => break,
            Some(_) => {}
            None => panic!("controller stopped"),
        }
    }
    assert_quiet(&mut runtime).await;
    assert_eq!(planner.calls(), 0);

    runtime.start_task("second", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;
    assert_eq!(messages.last(), Some(&finished("second done")));
    assert_eq!(planner.seen()[0].goal, "second");

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_restart_right_after_cancel_plans_on_fresh_observation() {
    let page = FakePage::new(vec![FakeElement::button(1, "Press")]);
    let planner = ScriptedPlanner::new(vec![Decision::click("agent-id-1"), Decision::finish("pressed")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("first", "key").unwrap();
    runtime.cancel().unwrap();
    runtime.start_task("second", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert!(statuses(&messages).contains(&"Task cancelled.".to_string()));
    assert_eq!(messages.last(), Some(&finished("pressed")));

    // the first task's observation is answered but never planned on
    assert_eq!(page.state().observations, 3);
    assert_eq!(planner.calls(), 2);
    assert!(planner.seen().iter().all(|seen| seen.goal == "second"));
    assert_eq!(page.state().clicks, vec![(1, ClickStrategy::Native)]);

    assert_quiet(&mut runtime).await;
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_injection_failure_is_fatal_and_recoverable() {
    let page = FakePage::new(vec![FakeElement::button(1, "Go")]);
    page.state().fail_injection = true;
    let planner = ScriptedPlanner::new(vec![Decision::finish("recovered")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("first", "key").unwrap();
    match runtime.wait_for_outcome(|_| {}).await.unwrap() {
        Outcome::Failed(error) => assert!(error.starts_with("injection-failed: "), "{}", error),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(planner.calls(), 0);
    assert_quiet(&mut runtime).await;

    page.state().fail_injection = false;
    runtime.start_task("second", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;
    assert_eq!(messages.last(), Some(&finished("recovered")));

    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_planner_failure_is_fatal() {
    let page = FakePage::new(vec![FakeElement::button(1, "Go")]);
    let planner = ScriptedPlanner::with_results(vec![Err(AgentError::PlannerHttp(
        "500 Internal Server Error".to_string(),
    ))]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    runtime.start_task("goal", "bad-key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    let errors: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m, Message::AgentError { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        messages.last(),
        Some(&Message::AgentError {
            error: "planner-http: planner request failed: 500 Internal Server Error".to_string()
        })
    );
    assert!(actions(&messages).is_empty());

    assert_quiet(&mut runtime).await;
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_wait_command_completes() {
    let page = FakePage::new(vec![FakeElement::button(1, "Go")]);
    let planner = ScriptedPlanner::new(vec![Decision::wait(None), Decision::finish("waited")]);
    let mut runtime = start(&page, &planner, AgentConfig::default());

    let started = tokio::time::Instant::now();
    runtime.start_task("Wait a bit", "key").unwrap();
    let messages = run_to_end(&mut runtime).await;

    assert!(messages.contains(&Message::status(
        "Action completed: WAIT completed successfully",
        StatusLevel::Success
    )));
    // default wait plus the action settle
    assert!(started.elapsed() >= Duration::from_millis(3000));

    runtime.shutdown().await.unwrap();
}
