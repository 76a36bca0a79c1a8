//! Coin-operated turnstile.
//!
//! Run with `RUST_LOG=switchyard=trace cargo run --example turnstile` to see
//! dispatch spans and ignored events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use switchyard::{transition_table, DispatchConfig, MachineBuilder, ThreadDispatcher};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Turnstile {
    Locked,
    Unlocked,
    OutOfOrder,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Input {
    Coin,
    Push,
    Kick,
}

#[derive(Debug)]
enum Effect {
    Unlatch,
    Latch,
    CountVisitor,
    CallTechnician,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config: DispatchConfig = serde_json::from_str(r#"{"thread_name": "turnstile-fx"}"#)?;
    let visitors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&visitors);

    let mut machine = MachineBuilder::new()
        .initial(Turnstile::Locked)
        .table(transition_table! {
            (Turnstile::Locked, Input::Coin) => Turnstile::Unlocked; [Effect::Unlatch],
            (Turnstile::Unlocked, Input::Push) => Turnstile::Locked; [Effect::CountVisitor, Effect::Latch],
            (Turnstile::Locked, Input::Kick) => Turnstile::OutOfOrder; [Effect::CallTechnician],
            (Turnstile::OutOfOrder, Input::Coin) => Turnstile::Unlocked,
        })
        .ending_state(Turnstile::OutOfOrder)
        .dispatcher(ThreadDispatcher::from_config(config))
        .on_state_change(|from: &Turnstile, to: &Turnstile| println!("{from:?} -> {to:?}"))
        .on_side_effect(move |effect: &Effect| {
            if matches!(effect, Effect::CountVisitor) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            println!("  side effect: {effect:?}");
        })
        .build()?;

    let (done_tx, done_rx) = mpsc::channel();
    for input in [Input::Push, Input::Coin, Input::Push, Input::Kick, Input::Coin] {
        let done = done_tx.clone();
        match machine.try_fire_with(&input, move || {
            let _ = done.send(());
        }) {
            Ok(fired) if fired.dispatch.is_some() => done_rx.recv()?,
            Ok(_) => {}
            Err(err) => println!("ignored {input:?}: {err}"),
        }
    }

    println!(
        "final state {:?}, {} visitor(s)",
        machine.current_state(),
        visitors.load(Ordering::SeqCst)
    );
    Ok(())
}
