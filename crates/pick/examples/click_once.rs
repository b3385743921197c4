//! Click-once buttons: the handler rewrites the clicked button and detaches itself

use std::cell::RefCell;
use std::rc::Rc;

use pick::{listener, node, pick, select, Listener, MemoryDocument, Selector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let doc = Rc::new(MemoryDocument::from_html(
        "<button id=\"a\">Click me</button> <button id=\"b\">Or me</button>",
    )?);

    let weak_doc = Rc::downgrade(&doc);
    pick(
        &*doc,
        Selector::ready(move || {
            let Some(doc) = weak_doc.upgrade() else {
                return;
            };

            // The handler needs its own identity to detach itself
            let slot: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));
            let click_handler = {
                let doc = Rc::downgrade(&doc);
                let slot = Rc::clone(&slot);
                listener(move |event| {
                    let (Some(doc), Some(me)) = (doc.upgrade(), slot.borrow().clone()) else {
                        return;
                    };
                    let button = node(&*doc, event.current_target);
                    let result = button
                        .set_text("Good job!")
                        .and_then(|b| b.set_css("font-size", "20px"))
                        .and_then(|b| b.set_attr("title", "No more clicks allowed!"))
                        .and_then(|b| b.off("click", &me));
                    if let Err(e) = result {
                        tracing::error!("Click handler failed: {}", e);
                    }
                })
            };
            *slot.borrow_mut() = Some(Rc::clone(&click_handler));

            if let Err(e) = select(&*doc, "button").on("click", &click_handler) {
                tracing::error!("Failed to attach click handler: {}", e);
            }
        }),
    );

    println!("Before ready: {}", doc.outer_html(doc.root())?);
    doc.fire_ready();

    let first = select(&*doc, "#a").first()?.ok_or("missing #a")?;
    println!("First click ran {} listener(s)", doc.dispatch_event(first, "click")?);
    println!("Second click ran {} listener(s)", doc.dispatch_event(first, "click")?);
    println!("After clicks: {}", doc.outer_html(doc.root())?);

    let second = select(&*doc, "#b");
    println!("#b title before click: {}", second.attr_or("title", "(none)")?);

    Ok(())
}
