// crates/folio-core/tests/include_loader.rs
// Include loader: completion timing, isolation, substitution, script re-activation

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use common::{Fragments, TokioTimer};
use folio_core::config::IncludeConfig;
use folio_core::include::{FAILED_CLASS, LOADING_CLASS, READY_CLASS, STATE_ATTRIBUTE};
use folio_core::memory::{self, MemoryPage};
use folio_core::{INCLUDES_LOADED_EVENT, IncludeError, IncludeLoader, ListenTarget, PageHost};
use tokio::time::Instant;

const THREE_SLOTS: &str = r#"<body>
    <header id="a" data-include="/partials/a.html"></header>
    <main id="b" data-include="/partials/b.html"></main>
    <footer id="c" data-include="/partials/c.html"></footer>
</body>"#;

fn loader(
    page: &Rc<MemoryPage>,
    source: Fragments,
) -> IncludeLoader<MemoryPage, Fragments, TokioTimer> {
    IncludeLoader::new(page.clone(), source, TokioTimer, IncludeConfig::default())
}

fn is_ready(page: &MemoryPage, id: &str) -> bool {
    let node = page.by_id(id).unwrap();
    page.has_class(&node, READY_CLASS)
}

#[tokio::test(start_paused = true)]
async fn completion_fires_once_after_every_placeholder() {
    let page = memory::page(THREE_SLOTS);
    let source = Fragments::new()
        .ok("/partials/a.html", 30, "<p>A</p>")
        .ok("/partials/b.html", 10, "<p>B</p>")
        .ok("/partials/c.html", 20, "<p>C</p>");
    let loader = loader(&page, source.clone());

    let start = Instant::now();
    let fired: Rc<RefCell<Vec<(Duration, bool)>>> = Rc::default();
    {
        let fired = fired.clone();
        let page = page.clone();
        loader.on_complete(move || {
            let all_ready = ["a", "b", "c"].iter().all(|id| is_ready(&page, id));
            fired.borrow_mut().push((start.elapsed(), all_ready));
        });
    }

    let events = Rc::new(Cell::new(0));
    {
        let events = events.clone();
        page.listen(
            ListenTarget::Document,
            INCLUDES_LOADED_EVENT,
            Rc::new(move |_: &folio_core::DomEvent| events.set(events.get() + 1)),
        )
        .unwrap();
    }

    let report = loader.run().await;
    assert_eq!(report.injected(), 3);

    let fired_at = fired.borrow().clone();
    assert_eq!(fired_at.len(), 1);
    let (elapsed, all_ready) = fired_at[0];
    assert!(all_ready, "signal fired before every placeholder was ready");
    assert!(elapsed >= Duration::from_millis(30));
    // fetches overlap: total is the slowest, not the sum
    assert!(elapsed < Duration::from_millis(60));
    assert_eq!(events.get(), 1);

    // A second pass finds nothing new and stays silent
    let again = loader.run().await;
    assert!(again.outcomes.is_empty());
    assert_eq!(fired.borrow().len(), 1);
    assert_eq!(events.get(), 1);
    assert_eq!(source.requests().len(), 3);
    assert!(loader.completion().is_raised());
}

#[tokio::test(start_paused = true)]
async fn placeholder_passes_through_loading_to_ready() {
    let page = memory::page(
        r#"<body><div id="slot" data-include="/partials/slow.html"></div></body>"#,
    );
    let loader = loader(&page, Fragments::new().ok("/partials/slow.html", 50, "<p>done</p>"));
    let slot = page.by_id("slot").unwrap();

    let observe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        (
            page.has_class(&slot, LOADING_CLASS),
            page.attribute(&slot, STATE_ATTRIBUTE),
        )
    };
    let (report, (loading, state)) = tokio::join!(loader.run(), observe);

    assert!(loading);
    assert_eq!(state.as_deref(), Some("loading"));
    assert_eq!(report.injected(), 1);
    assert!(!page.has_class(&slot, LOADING_CLASS));
    assert!(page.has_class(&slot, READY_CLASS));
    assert_eq!(page.attribute(&slot, STATE_ATTRIBUTE).as_deref(), Some("ready"));
    assert_eq!(page.text(&slot), "done");
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_does_not_block_siblings() {
    let page = memory::page(THREE_SLOTS);
    let source = Fragments::new()
        .status("/partials/a.html", 5, 404)
        .ok("/partials/b.html", 15, "<nav>menu</nav>");
    // c has no route at all and also 404s
    let loader = loader(&page, source);

    let completed = Rc::new(Cell::new(false));
    {
        let completed = completed.clone();
        loader.on_complete(move || completed.set(true));
    }

    let report = loader.run().await;
    assert!(completed.get());
    assert_eq!(report.injected(), 1);
    assert_eq!(report.failures().count(), 2);

    let a = page.by_id("a").unwrap();
    assert!(page.has_class(&a, FAILED_CLASS));
    assert!(page.has_class(&a, READY_CLASS));
    assert!(is_ready(&page, "c"));

    let b = page.by_id("b").unwrap();
    assert_eq!(page.text(&b), "menu");
    assert!(!page.has_class(&b, FAILED_CLASS));
}

#[tokio::test(start_paused = true)]
async fn tokens_are_replaced_everywhere() {
    let page = memory::page(
        r#"<body><section id="hero" data-include="/partials/hero.html" data-title="Selected Work"></section></body>"#,
    );
    let fragment = r#"<h1>{{title}}</h1><p class="lede">{{ title }}</p><span title="{{title}}">{{subtitle}}</span>"#;
    let loader = loader(&page, Fragments::new().ok("/partials/hero.html", 1, fragment));
    loader.run().await;

    let hero = page.by_id("hero").unwrap();
    let html = page.inner_html(&hero);
    assert_eq!(html.matches("Selected Work").count(), 3);
    assert!(!html.contains("{{"));
    // subtitle falls back to its built-in empty default
    assert!(html.contains(r#"<span title="Selected Work"></span>"#));
}

#[tokio::test(start_paused = true)]
async fn default_tokens_apply_without_data_values() {
    let page = memory::page(
        r#"<body><div id="slot" data-include="/partials/t.html"></div></body>"#,
    );
    let loader = loader(&page, Fragments::new().ok("/partials/t.html", 1, "<h2>{{title}}</h2>"));
    loader.run().await;
    let slot = page.by_id("slot").unwrap();
    assert_eq!(page.text(&slot), "Portfolio");
}

#[tokio::test(start_paused = true)]
async fn injected_scripts_run_once_with_attributes() {
    let page = memory::page(THREE_SLOTS);
    let source = Fragments::new()
        .ok(
            "/partials/a.html",
            5,
            r#"<script>window.__included = true;</script><p>hello</p>"#,
        )
        .ok(
            "/partials/b.html",
            5,
            r#"<script src="/js/widget.js" data-theme="dark" defer></script>"#,
        )
        .ok("/partials/c.html", 5, "<p>no scripts here</p>");
    let loader = loader(&page, source);
    loader.run().await;

    let executed = page.executed_scripts();
    assert_eq!(executed.len(), 2);
    assert!(executed.iter().any(|s| s.code.contains("window.__included = true")));
    assert!(executed.iter().any(|s| s.src.as_deref() == Some("/js/widget.js")));
    assert_eq!(page.inert_scripts(), 0);

    let b = page.by_id("b").unwrap();
    let script = page.query_all(&b, &folio_core::Query::Tag("script"))[0];
    assert_eq!(page.attribute(&script, "data-theme").as_deref(), Some("dark"));
    assert!(page.attribute(&script, "defer").is_some());

    let c = page.by_id("c").unwrap();
    assert!(page.query_all(&c, &folio_core::Query::Tag("script")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn year_is_stamped_inside_fragments() {
    let page = Rc::new(
        MemoryPage::new(
            r#"<body><footer id="f" data-include="/partials/footer.html"></footer></body>"#,
        )
        .with_year(2026),
    );
    let fragment = r#"<p>&copy; <span data-year></span></p><p id="year">1999</p>"#;
    let loader = loader(&page, Fragments::new().ok("/partials/footer.html", 1, fragment));
    loader.run().await;

    let footer = page.by_id("f").unwrap();
    let stamped = page.query_all(&footer, &folio_core::Query::Attr("data-year"))[0];
    assert_eq!(page.text(&stamped), "2026");
    let year = page.by_id("year").unwrap();
    assert_eq!(page.text(&year), "1999");
}

#[tokio::test(start_paused = true)]
async fn cross_origin_sources_are_refused() {
    let page = memory::page(
        r#"<body><div id="x" data-include="https://evil.example.net/x.html"></div><div id="y" data-include="/partials/y.html"></div></body>"#,
    );
    let source = Fragments::new().ok("/partials/y.html", 1, "<p>ok</p>");
    let loader = loader(&page, source.clone());
    let report = loader.run().await;

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], IncludeError::CrossOrigin { .. }));
    assert_eq!(source.requests(), vec![common::url("/partials/y.html")]);
    assert!(is_ready(&page, "x"));
}

#[tokio::test(start_paused = true)]
async fn slow_fragment_times_out_alone() {
    let page = memory::page(THREE_SLOTS);
    let source = Fragments::new()
        .ok("/partials/a.html", 5_000, "<p>late</p>")
        .ok("/partials/b.html", 10, "<p>B</p>")
        .ok("/partials/c.html", 10, "<p>C</p>");
    let config = IncludeConfig {
        timeout_ms: Some(100),
        ..IncludeConfig::default()
    };
    let loader = IncludeLoader::new(page.clone(), source, TokioTimer, config);

    let start = Instant::now();
    let report = loader.run().await;
    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(report.injected(), 2);

    let failure = report.failures().next().unwrap();
    assert!(matches!(failure, IncludeError::Timeout { .. }));
    assert_eq!(failure.src(), "/partials/a.html");

    let a = page.by_id("a").unwrap();
    assert!(page.has_class(&a, FAILED_CLASS));
    assert_eq!(page.text(&a), "");
}

#[tokio::test(start_paused = true)]
async fn page_without_placeholders_still_completes() {
    let page = memory::page("<body><p>static</p></body>");
    let loader = loader(&page, Fragments::new());
    let report = loader.run().await;
    assert!(report.outcomes.is_empty());
    assert!(loader.completion().is_raised());
    assert_eq!(page.dispatched(), vec![INCLUDES_LOADED_EVENT.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_runs_complete_after_placeholders_settle() {
    let page = memory::page(
        r#"<body><div id="slot" data-include="/partials/slow.html"></div></body>"#,
    );
    let source = Fragments::new().ok("/partials/slow.html", 50, "<p>done</p>");
    let loader = loader(&page, source.clone());

    let fired: Rc<RefCell<Vec<bool>>> = Rc::default();
    {
        let fired = fired.clone();
        let page = page.clone();
        loader.on_complete(move || fired.borrow_mut().push(is_ready(&page, "slot")));
    }

    let (first, second) = tokio::join!(loader.run(), loader.run());
    assert_eq!(first.injected() + second.injected(), 1);
    assert_eq!(*fired.borrow(), vec![true]);
    assert_eq!(page.dispatched(), vec![INCLUDES_LOADED_EVENT.to_string()]);
    assert_eq!(source.requests().len(), 1);
}
