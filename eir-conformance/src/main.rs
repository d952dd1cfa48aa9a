mod client;
mod context;
mod diameter_client;
mod tests;
#[allow(dead_code)] // fields exist for serde deserialization
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use client::EirClient;
use context::TestContext;

#[derive(Parser)]
#[command(
    name = "eir-conformance",
    about = "Black-box conformance tests for a live eir-daemon instance"
)]
struct Cli {
    /// HTTP façade address as host:port
    #[arg(long, default_value = "127.0.0.1:8080")]
    http: String,

    /// Diameter S13 listener address as host:port
    #[arg(long, default_value = "127.0.0.1:3868")]
    diameter: String,

    /// Origin-Host advertised in this harness's own CER
    #[arg(long, default_value = "eir-conformance.local")]
    origin_host: String,

    /// Origin-Realm advertised in this harness's own CER
    #[arg(long, default_value = "local")]
    origin_realm: String,
}

async fn setup(cli: &Cli) -> Result<Arc<TestContext>> {
    let http = EirClient::new(&cli.http);
    http.wait_for_ready(Duration::from_secs(10)).await?;

    Ok(Arc::new(TestContext {
        http,
        diameter_addr: cli.diameter.clone(),
        origin_host: cli.origin_host.clone(),
        origin_realm: cli.origin_realm.clone(),
    }))
}

fn main() {
    let all_args: Vec<String> = std::env::args().collect();

    // clap handles --http/--diameter/--origin-*, libtest-mimic handles
    // --list/filters/etc.
    let mut our_args = vec![all_args[0].clone()];
    let mut test_args = vec![all_args[0].clone()];
    let mut i = 1;
    while i < all_args.len() {
        match all_args[i].as_str() {
            "--http" | "--diameter" | "--origin-host" | "--origin-realm" => {
                our_args.push(all_args[i].clone());
                if i + 1 < all_args.len() {
                    i += 1;
                    our_args.push(all_args[i].clone());
                }
            }
            _ if all_args[i].starts_with("--http=")
                || all_args[i].starts_with("--diameter=")
                || all_args[i].starts_with("--origin-host=")
                || all_args[i].starts_with("--origin-realm=") =>
            {
                our_args.push(all_args[i].clone());
            }
            _ => {
                test_args.push(all_args[i].clone());
            }
        }
        i += 1;
    }

    let cli = Cli::parse_from(&our_args);
    let mimic_args = libtest_mimic::Arguments::from_iter(test_args);

    let mut all_tests = Vec::new();
    all_tests.extend(tests::store::register());
    all_tests.extend(tests::http::register());
    all_tests.extend(tests::diameter::register());

    if mimic_args.list {
        libtest_mimic::run(&mimic_args, all_tests).exit();
    }

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    let ctx = rt.block_on(setup(&cli)).unwrap_or_else(|e| {
        eprintln!("Failed to reach eir-daemon: {e:#}");
        eprintln!("usage: eir-conformance --http <ADDR:PORT> --diameter <ADDR:PORT>");
        std::process::exit(1);
    });

    context::set_context(ctx);
    libtest_mimic::run(&mimic_args, all_tests).exit();
}
