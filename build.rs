use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // test libraries resolve `unit_test_register` from the runner binary
    let unix = env::var("CARGO_CFG_TARGET_FAMILY")
        .map(|families| families.split(',').any(|family| family == "unix"))
        .unwrap_or(false);
    if unix {
        println!("cargo:rustc-link-arg-bins=-rdynamic");
        println!("cargo:rustc-link-arg-tests=-rdynamic");
    }
}
