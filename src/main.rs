use clap::{Parser, Subcommand};
use order_book_engine::client::Client;
use order_book_engine::engine::{EngineConfig, MatchingEngine};
use order_book_engine::events::Event;
use order_book_engine::observer::ChannelObserver;
use order_book_engine::orders::{ClientId, OrderFields, Side};
use order_book_engine::price::Price;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(
    author = "Andrew Odiit",
    version = "0.1",
    about = "A demo of a limit-order-book matching engine"
)]
struct Cli {
    /// Emit trace-level spans instead of info-level.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs a scripted insert/cross/cancel scenario against a fresh
    /// engine and prints every event two subscribed clients receive.
    Demo,
}

/// Walks two clients through a rest and a partial cross — the shape of
/// spec scenarios 1 and 2 — printing every event each client's channel
/// receives.
fn run_demo() -> anyhow::Result<()> {
    let engine = MatchingEngine::new(EngineConfig {
        instrument: "DEMO-USD".to_string(),
        ..EngineConfig::default()
    });
    let engine = std::sync::Arc::new(engine);

    let (sink1, rx1) = ChannelObserver::new();
    let (sink2, rx2) = ChannelObserver::new();
    let c1 = Client::new(ClientId(1), engine.clone(), std::sync::Arc::new(sink1));
    let c2 = Client::new(ClientId(2), engine.clone(), std::sync::Arc::new(sink2));

    let ack = c1.insert_order(OrderFields {
        side: Side::Buy,
        price: Price::from_units(100),
        amount: 10,
    });
    tracing::info!(?ack, "C1 resting buy @100 x10");

    let ack = c2.insert_order(OrderFields {
        side: Side::Sell,
        price: Price::from_units(99),
        amount: 4,
    });
    tracing::info!(?ack, "C2 marketable sell @99 x4");

    // Give the processor thread a moment to drain before we read back
    // events, so the printed order matches the causal order above.
    std::thread::sleep(Duration::from_millis(50));

    for event in rx2.try_iter() {
        print_event("C2", event);
    }
    for event in rx1.try_iter() {
        print_event("C1", event);
    }

    // Dropping both clients and this last handle brings the engine's
    // strong count to zero, which runs `Drop for MatchingEngine` and
    // joins the processor thread.
    drop(c1);
    drop(c2);
    drop(engine);
    Ok(())
}

fn print_event(who: &str, event: Event) {
    match event {
        Event::Trade(t) => println!("[{who}] Trade {}@{} x{}", t.maker_order_id, t.price, t.amount),
        Event::OrderUpdate(u) => println!(
            "[{who}] OrderUpdate {} status={:?} unfilled={}",
            u.order_id, u.status, u.new_unfilled_amount
        ),
        Event::Ack(a) => println!("[{who}] Ack success={} {}", a.success, a.message),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::TRACE } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Demo => run_demo(),
    }
}
