use tourmaline::stress_test::{stress_test_recorder, stress_test_scaling};
use tracing_subscriber::EnvFilter;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main());
    Ok(())
}

async fn async_main() {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: few writers, small batches
    let stats = stress_test_recorder(4, 2, 100, 8).await;
    stats.print();

    // Test 2: more writers than readers, larger batches
    let stats = stress_test_recorder(10, 4, 200, 32).await;
    stats.print();

    // Test 3: read-heavy
    let stats = stress_test_recorder(2, 16, 200, 16).await;
    stats.print();

    // Test 4: Scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS (Batch Size)                     ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(64, 16).await;

    println!("\n✓ All stress tests completed successfully!");
}
