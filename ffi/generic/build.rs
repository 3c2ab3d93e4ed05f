use std::env;

use cbindgen::{Builder, Config};

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();

    Builder::new()
        .with_crate(&crate_dir)
        .with_config(Config::from_file(format!("{}/cbindgen.toml", crate_dir)).unwrap())
        .generate()
        .expect("Unable to generate bindings")
        .write_to_file(format!("{}/bindings.h", crate_dir));
}
