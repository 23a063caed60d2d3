use page_pilot::dom::{self, BindingTable};
use page_pilot::page::PageDriver;
use page_pilot::planner::Decision;
use page_pilot::{BrowserSession, ChromePage, ExecutorTimings, LaunchOptions, Message, PageAgent};

fn open(html: &str) -> (BrowserSession, ChromePage) {
    let session = BrowserSession::launch(LaunchOptions::new().headless(true).sandbox(false))
        .expect("Failed to launch browser");

    session
        .navigate(&format!("data:text/html,{}", html))
        .expect("Failed to navigate");

    // Small delay to let page render
    std::thread::sleep(std::time::Duration::from_millis(500));

    let page = session.active_page().expect("Failed to get page");
    (session, page)
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Chrome to be installed
async fn test_observe_catalog() {
    let (_session, page) = open(concat!(
        "<html><head><title>Catalog</title></head><body>",
        "<h1>A heading long enough to keep</h1>",
        "<button id='go'>Go</button>",
        "<a href='/next'>Next page</a>",
        "<button disabled>Off</button>",
        "<input name='q' placeholder='Search'>",
        "</body></html>"
    ));

    let mut bindings = BindingTable::new();
    let catalog = dom::observe(&page, &mut bindings).await.expect("Failed to observe");

    println!("Catalog: {}", catalog.to_json().unwrap());

    assert_eq!(catalog.page_context.title, "Catalog");
    assert_eq!(
        catalog.agent_ids().collect::<Vec<_>>(),
        vec!["agent-id-1", "agent-id-2", "agent-id-3"]
    );
    assert_eq!(catalog.find("agent-id-1").unwrap().id.as_deref(), Some("go"));
    assert!(catalog.elements.iter().any(|r| r.is_context && r.tag == "h1"));
    assert_eq!(bindings.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn test_observe_twice_is_stable() {
    let (_session, page) = open("<html><body><button>One</button><button>Two</button></body></html>");

    let mut bindings = BindingTable::new();
    let first = dom::observe(&page, &mut bindings).await.unwrap();
    let second = dom::observe(&page, &mut bindings).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn test_type_and_click() {
    let (_session, page) = open(concat!(
        "<html><body>",
        "<input id='q' oninput='document.title=this.value'>",
        "<button onclick='document.body.dataset.done=1'>Done</button>",
        "</body></html>"
    ));

    let mut agent = PageAgent::new(page, ExecutorTimings::default());
    assert!(matches!(agent.handle(Message::Observe).await, Some(Message::DomObservation(_))));

    let typed = agent
        .handle(Message::ExecuteAction(Decision::type_text("agent-id-1", "hello")))
        .await;
    assert!(matches!(typed, Some(Message::ActionCompleted { .. })), "{:?}", typed);

    let clicked = agent.handle(Message::ExecuteAction(Decision::click("agent-id-2"))).await;
    assert!(matches!(clicked, Some(Message::ActionCompleted { .. })), "{:?}", clicked);

    let context = agent.driver().page_context().await.unwrap();
    assert_eq!(context.title, "hello");
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn test_removed_element_is_stale() {
    let (_session, page) = open("<html><body><button onclick='this.remove()'>Vanish</button></body></html>");

    let mut agent = PageAgent::new(page, ExecutorTimings::default());
    agent.handle(Message::Observe).await;

    let first = agent.handle(Message::ExecuteAction(Decision::click("agent-id-1"))).await;
    assert!(matches!(first, Some(Message::ActionCompleted { .. })));

    let second = agent.handle(Message::ExecuteAction(Decision::click("agent-id-1"))).await;
    match second {
        Some(Message::ActionError { error, .. }) => assert_eq!(error, "stale-binding"),
        other => panic!("unexpected {:?}", other),
    }
}
