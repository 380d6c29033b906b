use anyhow::{Context, Result};
use loom_dom::{Document, Dom, Event, EventLoop, NodeId};
use loom_elements::{
    Accordion, AccordionState, AnimatedContainer, ContentKind, ContentResolver, ElementContext,
    ElementError, ElementRegistry, Fallback, Hosted, LoadState, Runtime,
};

fn mounted(markup: &str) -> Result<(Runtime, NodeId)> {
    let mut document = Document::new();
    let body = document.body();
    document.append_html(body, markup)?;
    let context = ElementContext::with_timeline(Dom::new(document), EventLoop::new());
    let runtime = Runtime::new(context, ElementRegistry::builtin());
    runtime.connect_tree(body)?;
    runtime.context().event_loop().run_until_idle();
    Ok((runtime, body))
}

fn find(runtime: &Runtime, selector: &str) -> Result<NodeId> {
    let body = runtime.context().dom().borrow().body();
    runtime
        .context()
        .dom()
        .borrow()
        .query_selector(body, selector)?
        .with_context(|| format!("no element matches {selector}"))
}

fn click(runtime: &Runtime, node: NodeId) {
    runtime
        .context()
        .dom()
        .dispatch_event(node, &Event::bubbling("click"));
}

const SWAPPING: &str = r#"
    <ui-animate id="panel" animation-keyframe-to-opacity="1">
      <button data-trigger>Send</button>
      <div data-content><p id="idle">Idle</p></div>
      <div data-swap><p id="busy">Sending</p></div>
    </ui-animate>"#;

#[test]
fn swap_reverts_to_the_original_nodes() -> Result<()> {
    let (runtime, _) = mounted(SWAPPING)?;
    let trigger = find(&runtime, "[data-trigger]")?;
    let content = find(&runtime, "[data-content]")?;
    let idle = find(&runtime, "#idle")?;
    let busy = find(&runtime, "#busy")?;

    click(&runtime, trigger);
    assert_eq!(runtime.context().dom().borrow().children(content), &[busy]);

    runtime.context().event_loop().advance(799);
    assert_eq!(runtime.context().dom().borrow().children(content), &[busy]);

    runtime.context().event_loop().advance(1);
    let dom = runtime.context().dom().borrow();
    assert_eq!(dom.children(content), &[idle]);
    let swap = dom.query_selector(dom.body(), "[data-swap]")?.context("swap")?;
    assert_eq!(dom.children(swap), &[busy]);
    Ok(())
}

#[test]
fn disconnect_revokes_trigger_listeners() -> Result<()> {
    let (runtime, _) = mounted(SWAPPING)?;
    let host = find(&runtime, "#panel")?;
    let trigger = find(&runtime, "[data-trigger]")?;
    let container = runtime
        .component::<AnimatedContainer>(host)
        .context("animated container")?;

    click(&runtime, trigger);
    assert_eq!(container.plays(), 1);

    assert!(runtime.disconnect(host));
    click(&runtime, trigger);
    assert_eq!(container.plays(), 1);
    Ok(())
}

#[test]
fn disconnect_cancels_pending_revert() -> Result<()> {
    let (runtime, _) = mounted(SWAPPING)?;
    let host = find(&runtime, "#panel")?;
    let trigger = find(&runtime, "[data-trigger]")?;
    let content = find(&runtime, "[data-content]")?;
    let busy = find(&runtime, "#busy")?;

    click(&runtime, trigger);
    runtime.disconnect(host);
    runtime.context().event_loop().advance(1_000);

    assert_eq!(runtime.context().dom().borrow().children(content), &[busy]);
    assert_eq!(runtime.context().event_loop().pending_timers(), 0);
    Ok(())
}

#[test]
fn removing_a_subtree_disconnects_it() -> Result<()> {
    let (runtime, _) = mounted(&format!("<main>{SWAPPING}</main>"))?;
    let main = find(&runtime, "main")?;
    let trigger = find(&runtime, "[data-trigger]")?;
    let host = find(&runtime, "#panel")?;
    let container = runtime
        .component::<AnimatedContainer>(host)
        .context("animated container")?;

    assert_eq!(runtime.remove(main)?, 1);
    click(&runtime, trigger);
    assert_eq!(container.plays(), 0);
    assert!(container.host().is_aborted());
    Ok(())
}

#[test]
fn content_lookup_reports_missing_and_mismatched_parts() -> Result<()> {
    let (runtime, _) = mounted(
        r#"<ui-animate id="empty"></ui-animate>
           <ui-animate id="templated" content="template"><template><b>x</b></template></ui-animate>"#,
    )?;
    let empty = runtime
        .component::<AnimatedContainer>(find(&runtime, "#empty")?)
        .context("empty container")?;
    assert_eq!(
        empty.content(ContentKind::Element),
        Err(ElementError::ContentNotFound {
            selector: "[data-content]".to_string()
        })
    );

    let templated = runtime
        .component::<AnimatedContainer>(find(&runtime, "#templated")?)
        .context("templated container")?;
    assert!(templated.content(ContentKind::Template).is_ok());
    assert!(matches!(
        templated.content(ContentKind::Tag("section".to_string())),
        Err(ElementError::ContentMismatch { .. })
    ));
    Ok(())
}

#[test]
fn accordion_opens_and_closes_on_click() -> Result<()> {
    let (runtime, _) = mounted(
        r#"<ui-accordion id="faq" animation-keyframe-from-height="0px" animation-keyframe-to-height="80px">
             <button data-trigger>Shipping</button>
             <div data-content>Three days</div>
           </ui-accordion>"#,
    )?;
    let host = find(&runtime, "#faq")?;
    let trigger = find(&runtime, "[data-trigger]")?;
    let accordion = runtime
        .component::<Accordion>(host)
        .context("accordion")?;
    let event_loop = runtime.context().event_loop().clone();

    click(&runtime, trigger);
    assert!(accordion.is_open());
    event_loop.advance(200);

    click(&runtime, trigger);
    assert!(accordion.is_open());
    event_loop.advance(200);
    assert_eq!(accordion.state(), AccordionState::Closed);

    let dom = runtime.context().dom().borrow();
    assert_eq!(dom.get_attribute(host, "data-state"), Some("closed"));
    assert_eq!(dom.get_attribute(trigger, "aria-expanded"), Some("false"));
    Ok(())
}

#[test]
fn fallback_follows_media_events() -> Result<()> {
    let (runtime, _) = mounted(
        r#"<ui-fallback id="ok"><img data-content id="ok-img"><span data-fallback></span></ui-fallback>
           <ui-fallback id="bad"><img data-content id="bad-img"><span data-fallback></span></ui-fallback>"#,
    )?;
    let ok = runtime
        .component::<Fallback>(find(&runtime, "#ok")?)
        .context("ok fallback")?;
    let bad = runtime
        .component::<Fallback>(find(&runtime, "#bad")?)
        .context("bad fallback")?;

    let dom = runtime.context().dom().clone();
    dom.dispatch_event(find(&runtime, "#ok-img")?, &Event::new("load"));
    dom.dispatch_event(find(&runtime, "#bad-img")?, &Event::new("error"));

    assert_eq!(ok.state(), LoadState::Loaded);
    assert_eq!(bad.state(), LoadState::Failed);
    Ok(())
}

#[test]
fn shutdown_revokes_listeners_and_timers_of_every_element() -> Result<()> {
    let (runtime, _) = mounted(&format!(
        r#"{SWAPPING}<ui-accordion id="faq"><button data-trigger id="faq-trigger"></button><div data-content></div></ui-accordion>"#
    ))?;
    let trigger = find(&runtime, "[data-trigger]")?;
    let content = find(&runtime, "[data-content]")?;
    let busy = find(&runtime, "#busy")?;
    let accordion = runtime
        .component::<Accordion>(find(&runtime, "#faq")?)
        .context("accordion")?;

    click(&runtime, trigger);
    let pending = runtime.context().event_loop().pending_timers();
    assert!(pending >= 1);

    assert_eq!(runtime.shutdown(), 2);
    assert_eq!(runtime.context().event_loop().pending_timers(), pending - 1);
    assert!(runtime.context().dom().borrow().listeners().is_empty());

    click(&runtime, find(&runtime, "#faq-trigger")?);
    runtime.context().event_loop().advance(1_000);
    assert!(!accordion.is_open());
    assert_eq!(runtime.context().dom().borrow().children(content), &[busy]);
    Ok(())
}
