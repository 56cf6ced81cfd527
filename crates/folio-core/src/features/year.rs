// crates/folio-core/src/features/year.rs
// Footer year stamp

use std::rc::Rc;

use crate::Result;
use crate::host::{PageHost, Query};
use crate::rebind::Feature;

/// Fill empty `[data-year]` / `#year` elements under `scope` with the
/// current year. Elements that already have text are left alone.
pub fn stamp_year<H: PageHost>(host: &H, scope: &H::Node) -> usize {
    let year = host.current_year().to_string();
    let mut stamped = 0;
    for query in [Query::Attr("data-year"), Query::Id("year")] {
        for node in host.query_all(scope, &query) {
            if host.text(&node).trim().is_empty() {
                host.set_text(&node, &year);
                stamped += 1;
            }
        }
    }
    stamped
}

/// Stamps on every trigger. Idempotent because filled elements are skipped.
#[derive(Debug, Default)]
pub struct FooterYear;

impl<H: PageHost> Feature<H> for FooterYear {
    fn name(&self) -> &'static str {
        "footer-year"
    }

    fn bind(&self, host: &Rc<H>, scope: &H::Node) -> Result<usize> {
        Ok(stamp_year(&**host, scope))
    }
}
