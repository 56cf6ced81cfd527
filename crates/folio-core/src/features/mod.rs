// crates/folio-core/src/features/mod.rs
// Page features that bind to markup which may arrive before or after includes

pub mod carousel;
pub mod comments;
pub mod contact;
pub mod nav;
pub mod reveal;
pub mod scroll;
pub mod sticky;
pub mod video;
pub mod year;

pub use carousel::Carousel;
pub use comments::Comments;
pub use contact::ContactForm;
pub use nav::MobileNav;
pub use reveal::Reveal;
pub use scroll::SmoothScroll;
pub use sticky::StickyNav;
pub use video::VideoModal;
pub use year::FooterYear;

use crate::config::SiteConfig;
use crate::contact::ContactTransport;
use crate::host::{PageHost, Timer};
use crate::rebind::Coordinator;

/// Shared "open" state class for menus and modals
pub const OPEN_CLASS: &str = "is-open";

/// Register every standard feature in a fixed order
pub fn install<H, T, C>(
    coordinator: &mut Coordinator<H>,
    config: &SiteConfig,
    transport: T,
    timer: C,
) where
    H: PageHost,
    T: ContactTransport + 'static,
    C: Timer + 'static,
{
    coordinator
        .register(FooterYear)
        .register(MobileNav::new())
        .register(StickyNav::new(config.nav.clone()))
        .register(Reveal::default())
        .register(SmoothScroll::default())
        .register(Carousel::default())
        .register(VideoModal::default())
        .register(Comments::new(config.comments.clone()))
        .register(ContactForm::new(config.contact.clone(), transport, timer));
}
