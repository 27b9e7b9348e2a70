fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the ESP-IDF build needs the toolchain environment; host test
    // builds run without embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
