//! A UI-style component that ties its event subscriptions to its own lifetime.
//!
//! The component attaches listeners to two targets through a `ListenersCollection`,
//! publishes size changes on a `LocalTypedEvent` and detaches everything in `destroy()`.

use std::cell::Cell;
use std::rc::Rc;

use event_kit::{
    EventCallback, ListenerOptions, ListenersCollection, LocalEventTarget, LocalTypedEvent,
};

type Target = LocalEventTarget<String>;

struct AutoGrowingInput {
    height: Rc<Cell<usize>>,
    resized: Rc<LocalTypedEvent<usize>>,
    listeners: ListenersCollection<Target>,
}

impl AutoGrowingInput {
    fn new(input: &Rc<Target>, window: &Rc<Target>) -> event_kit::Result<Self> {
        let height = Rc::new(Cell::new(1));
        let resized = Rc::new(LocalTypedEvent::new());
        let listeners = ListenersCollection::new();

        let on_keyup: EventCallback<String> = Rc::new({
            let height = Rc::clone(&height);
            let resized = Rc::clone(&resized);
            move |text: &String| {
                let lines = text.lines().count().max(1);
                if lines != height.get() {
                    height.set(lines);
                    resized.emit(&lines);
                }
            }
        });

        let on_resize: EventCallback<String> = Rc::new(|size: &String| {
            println!("Window resized to {size}");
        });

        listeners.add(Rc::clone(input), "keyup", on_keyup, ListenerOptions::new())?;
        listeners.add(
            Rc::clone(window),
            "resize",
            on_resize,
            ListenerOptions::new().with_passive(true),
        )?;

        Ok(Self {
            height,
            resized,
            listeners,
        })
    }

    fn destroy(&self) {
        self.listeners.remove_all();
    }
}

fn main() -> event_kit::Result<()> {
    println!("=== Component Teardown Example ===");

    let input = Rc::new(Target::new());
    let window = Rc::new(Target::new());

    let component = AutoGrowingInput::new(&input, &window)?;

    let _subscription = component.resized.on(Rc::new(|lines: &usize| {
        println!("Input now shows {lines} line(s)");
    }));

    input.dispatch("keyup", &"first line".to_string());
    input.dispatch("keyup", &"first line\nsecond line".to_string());
    window.dispatch("resize", &"800x600".to_string());

    component.destroy();
    println!("Component destroyed, further events are ignored.");

    let delivered = input.dispatch("keyup", &"a\nb\nc".to_string());
    println!("Listeners reached after teardown: {delivered}");
    println!("Final height: {} line(s)", component.height.get());

    Ok(())
}
