use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../client/Cargo.toml");
    println!("cargo:rerun-if-changed=../client/src");
    println!("cargo:rerun-if-changed=../client/web/index.html");
    println!("cargo:rerun-if-env-changed=CIRCLE_IO_SKIP_WASM");

    if std::env::var_os("CIRCLE_IO_SKIP_WASM").is_some() {
        println!("cargo:warning=CIRCLE_IO_SKIP_WASM set, embedding client/web as-is");
        return;
    }

    // Separate target dir so the nested build does not wait on our lock
    let status = Command::new("wasm-pack")
        .args(["build", "--target", "web", "--out-dir", "./web/pkg", "--target-dir", "../../target/wasm"])
        .current_dir("../client")
        .status();

    match status {
        Ok(status) if status.success() => {
            println!("cargo:warning=WASM client built - assets will be embedded");
        }
        Ok(status) => {
            println!("cargo:warning=WASM client build failed ({status}); serving without pkg/");
        }
        Err(e) => {
            println!("cargo:warning=wasm-pack not available ({e}); serving without pkg/");
        }
    }
}
