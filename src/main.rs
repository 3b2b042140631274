// Small driver for the generation core: runs one command against the
// configured backend and prints the result as JSON.
//
//   fitswap transform <dish>
//   fitswap pantry <ingredient>...
//   fitswap plan [meals-per-day]
//   fitswap quota
//
// Purchases always use the mock entitlement source here; there is no
// platform store to bridge to from a terminal.

use fitswap::ai::GenerationProgress;
use fitswap::commands::{self, AppState};
use fitswap::config::EntitlementMode;
use fitswap::models::UserProfile;
use fitswap::AppConfig;

const DEMO_UID: &str = "demo";

fn print_progress(progress: GenerationProgress) {
    eprintln!("[{:>3.0}%] {}", progress.fraction * 100.0, progress.message);
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn usage() -> ! {
    eprintln!("usage: fitswap <transform <dish> | pantry <ingredient>... | plan [meals] | quota>");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    fitswap::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        usage();
    };

    let mut config = AppConfig::from_env()?;
    config.entitlements = EntitlementMode::Mock;
    let state = AppState::init(config, None)?;
    state.start().await;
    if state.profiles.get(DEMO_UID).await?.is_none() {
        state.profiles.set(DEMO_UID, &UserProfile::new(DEMO_UID)).await?;
    }

    match command.as_str() {
        "transform" if !rest.is_empty() => {
            let dish = rest.join(" ");
            let outcome = commands::transform_dish(&state, DEMO_UID, &dish, &print_progress).await?;
            print_json(&outcome)?;
        }
        "pantry" if !rest.is_empty() => {
            let outcome =
                commands::generate_from_pantry(&state, DEMO_UID, rest, &print_progress).await?;
            print_json(&outcome)?;
        }
        "plan" => {
            let meals = match rest.first() {
                Some(n) => n.parse()?,
                None => 3,
            };
            let plan = commands::plan_week(&state, DEMO_UID, "", meals, false).await?;
            print_json(&plan)?;
        }
        "quota" => {
            let info = commands::subscription_info(&state, DEMO_UID).await?;
            print_json(&info)?;
        }
        _ => usage(),
    }

    state.dispose();
    Ok(())
}
