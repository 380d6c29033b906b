use std::rc::Rc;

use anyhow::{Context, Result};
use loom_animate::{AnimationDefaults, AnimationDriver, ReducedMotionPolicy, TimelineBackend};
use loom_config::{LoomConfig, ReducedMotion};
use loom_dom::{Document, Dom, Event, EventLoop};
use loom_elements::{ElementContext, ElementRegistry, HostSettings, Runtime};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAMPLE_MARKUP: &str = r#"
<ui-accordion id="shipping"
    animation-keyframe-from-height="0px"
    animation-keyframe-to-height="96px"
    animation-option-easing="ease-out">
  <button data-trigger>Shipping</button>
  <div data-content>Orders ship within three days.</div>
</ui-accordion>
<ui-animate id="send"
    animation-keyframe-from-opacity="0.4"
    animation-keyframe-to-opacity="1"
    animation-option-duration="300">
  <button data-trigger>Send</button>
  <div data-content><span>Send message</span></div>
  <template data-swap><span>Sending</span></template>
</ui-animate>
<ui-fallback id="avatar">
  <img data-content src="avatar.png">
  <span data-fallback>AB</span>
</ui-fallback>
"#;

/// Total virtual time to run after the triggers fire.
const SETTLE_MS: u64 = 1_000;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = LoomConfig::load();
    let markup = match &config.demo.markup {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read demo markup {}", path.display()))?,
        None => SAMPLE_MARKUP.to_string(),
    };

    let mut document = Document::new();
    let body = document.body();
    document.append_html(body, &markup)?;
    let dom = Dom::new(document);
    let event_loop = EventLoop::new();

    let backend = Rc::new(
        TimelineBackend::new(event_loop.clone())
            .with_reduced_motion(config.animation.prefers_reduced_motion),
    );
    let driver = AnimationDriver::new(dom.clone(), backend)
        .with_defaults(AnimationDefaults {
            duration_ms: config.animation.duration_ms,
            easing: config.animation.easing.clone(),
        })
        .with_reduced_motion_policy(match config.animation.reduced_motion {
            ReducedMotion::Skip => ReducedMotionPolicy::Skip,
            ReducedMotion::JumpToEnd => ReducedMotionPolicy::JumpToEnd,
        });
    let settings = HostSettings {
        event: config.elements.event.clone(),
        trigger_selector: config.elements.trigger_selector.clone(),
        content_selector: config.elements.content_selector.clone(),
        swap_selector: config.elements.swap_selector.clone(),
        swap_revert_delay_ms: config.elements.swap_revert_delay_ms,
    };
    let context = ElementContext::new(dom.clone(), event_loop.clone(), driver).with_settings(settings);
    let runtime = Runtime::new(context, ElementRegistry::builtin());

    let connected = runtime.connect_tree(body)?;
    event_loop.run_until_idle();
    info!(connected, "elements mounted");

    let triggers = dom
        .borrow()
        .query_selector_all(body, &config.elements.trigger_selector)?;
    for trigger in triggers {
        dom.dispatch_event(trigger, &Event::bubbling(&config.elements.event));
    }
    event_loop.advance(SETTLE_MS);

    println!("{}", dom.borrow().inner_html(body));
    for event in runtime.context().driver().drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
