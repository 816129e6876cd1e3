//! Declares and provisions the example program.
//!
//! Backends are simulated in memory, so a run shows the resource graph and
//! the values each export would take without touching real infrastructure.
//!
//! # Usage
//!
//! ```bash
//! TESSERA_REDIS_BACKEND=docker redis-commander
//! TESSERA_REDIS_BACKEND=managed TESSERA_LOG_FORMAT=json redis-commander
//! ```

#![expect(clippy::print_stdout, clippy::print_stderr, reason = "command-line output")]

use tessera_core::Settings;
use tessera_providers::sim::SimBackends;
use tessera_redis::RedisSettings;
use tessera_system::output::OutputSnapshot;
use tessera_system::plugin::PluginGroup;
use tessera_system::stack::StackBuilder;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    });
    let redis_settings = RedisSettings::from_env();

    let stack = StackBuilder::new(settings.stack.clone())
        .add_plugins(settings.tracing_plugin())
        .add_plugins(SimBackends::new().build())
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(2);
        });

    if let Err(e) = example::build(&stack, &redis_settings) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let summary = stack.run().await;
    println!("{}", stack.render_tree());

    println!("Outputs:");
    for (name, snapshot) in stack.exports().snapshot() {
        match snapshot {
            OutputSnapshot::Resolved(value) => println!("    {name}: {value}"),
            OutputSnapshot::Failed(error) => println!("    {name}: <failed: {error}>"),
            OutputSnapshot::Pending => println!("    {name}: <pending>"),
        }
    }

    if !summary.is_success() {
        for failure in summary.failures() {
            eprintln!("Error: {failure}");
        }
        std::process::exit(1);
    }
}
