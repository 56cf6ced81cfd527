// crates/folio-core/src/features/contact.rs
// Contact form binding: intercept submit, post in the background, show status

use std::cell::Cell;
use std::rc::Rc;

use crate::Result;
use crate::config::ContactConfig;
use crate::contact::{ContactMessage, ContactTransport, submit_contact};
use crate::host::{DomEvent, ListenTarget, PageHost, Timer};
use crate::rebind::{BindKey, BindRegistry, Feature};

pub const SENDING_CLASS: &str = "is-sending";
pub const ERROR_CLASS: &str = "is-error";
pub const SUCCESS_CLASS: &str = "is-success";

pub const SENDING_MESSAGE: &str = "Sending…";
pub const SENT_MESSAGE: &str = "Thanks! Your message has been sent.";

pub struct ContactForm<T, C> {
    config: Rc<ContactConfig>,
    transport: Rc<T>,
    timer: Rc<C>,
    registry: BindRegistry,
}

impl<T, C> ContactForm<T, C> {
    pub fn new(config: ContactConfig, transport: T, timer: C) -> Self {
        Self {
            config: Rc::new(config),
            transport: Rc::new(transport),
            timer: Rc::new(timer),
            registry: BindRegistry::new("contact-form"),
        }
    }
}

fn read_message<H: PageHost>(host: &H, form: &H::Node) -> ContactMessage {
    let field = |name: &str| host.form_value(form, name).unwrap_or_default();
    ContactMessage {
        name: field("name"),
        email: field("email"),
        subject: field("subject"),
        message: field("message"),
    }
}

fn show_status<H: PageHost>(host: &H, config: &ContactConfig, text: &str, class: Option<&str>) {
    let Some(status) = host.by_id(&config.status_id) else {
        return;
    };
    host.set_text(&status, text);
    let applied = [ERROR_CLASS, SUCCESS_CLASS]
        .into_iter()
        .try_for_each(|c| host.remove_class(&status, c))
        .and_then(|_| match class {
            Some(class) => host.add_class(&status, class),
            None => Ok(()),
        });
    if let Err(e) = applied {
        log::debug!("Could not update form status: {}", e);
    }
}

fn set_busy<H: PageHost>(host: &H, form: &H::Node, busy: bool) {
    let applied = if busy {
        host.add_class(form, SENDING_CLASS)
            .and_then(|_| host.set_attribute(form, "aria-busy", "true"))
    } else {
        host.remove_class(form, SENDING_CLASS)
            .and_then(|_| host.remove_attribute(form, "aria-busy"))
    };
    if let Err(e) = applied {
        log::debug!("Could not update form state: {}", e);
    }
}

impl<H, T, C> Feature<H> for ContactForm<T, C>
where
    H: PageHost,
    T: ContactTransport + 'static,
    C: Timer + 'static,
{
    fn name(&self) -> &'static str {
        "contact-form"
    }

    fn bind(&self, host: &Rc<H>, _scope: &H::Node) -> Result<usize> {
        let Some(form) = host.by_id(&self.config.form_id) else {
            return Ok(0);
        };
        let key = BindKey::Node(host.key(&form));
        let attached = self.registry.bind_once(key, || self.attach(host, form))?;
        Ok(usize::from(attached))
    }
}

impl<T, C> ContactForm<T, C>
where
    T: ContactTransport + 'static,
    C: Timer + 'static,
{
    fn attach<H: PageHost>(&self, host: &Rc<H>, form: H::Node) -> Result<()> {
        let in_flight = Rc::new(Cell::new(false));
        let h = host.clone();
        let config = self.config.clone();
        let transport = self.transport.clone();
        let timer = self.timer.clone();
        let target = form.clone();

        host.listen(
            ListenTarget::Node(form),
            "submit",
            Rc::new(move |event: &DomEvent| {
                event.prevent_default();
                if in_flight.replace(true) {
                    return;
                }

                let message = read_message(&*h, &target);
                if let Err(e) = message.validate() {
                    show_status(&*h, &config, &e.user_message(), Some(ERROR_CLASS));
                    in_flight.set(false);
                    return;
                }

                show_status(&*h, &config, SENDING_MESSAGE, None);
                set_busy(&*h, &target, true);

                let (h, config, transport, timer, form, in_flight) = (
                    h.clone(),
                    config.clone(),
                    transport.clone(),
                    timer.clone(),
                    target.clone(),
                    in_flight.clone(),
                );
                h.clone().spawn(Box::pin(async move {
                    match submit_contact(&*transport, &*timer, &config, &message).await {
                        Ok(()) => {
                            show_status(&*h, &config, SENT_MESSAGE, Some(SUCCESS_CLASS));
                            h.reset_form(&form);
                        }
                        Err(e) => {
                            log::warn!("Contact submission failed: {}", e);
                            show_status(&*h, &config, &e.user_message(), Some(ERROR_CLASS));
                        }
                    }
                    set_busy(&*h, &form, false);
                    in_flight.set(false);
                }));
            }),
        )
    }
}
