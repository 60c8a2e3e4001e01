//! The console layer needs `--cfg tokio_unstable`; without it `profiling` compiles to nothing.

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-env-changed=RUSTFLAGS");

    let profiling = std::env::var_os("CARGO_FEATURE_PROFILING").is_some();
    let unstable = std::env::var_os("CARGO_CFG_TOKIO_UNSTABLE").is_some();
    if profiling && !unstable {
        println!(
            "cargo::warning=lumo-logger: `profiling` has no effect unless RUSTFLAGS contains \
             `--cfg tokio_unstable`"
        );
    }
}
