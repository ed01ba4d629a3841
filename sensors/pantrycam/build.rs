fn main() {
    // Provide app_main stub and ESP-IDF link args
    embuild::espidf::sysenv::output();

    // Compile-time network settings, see config.rs
    for var in ["WIFI_SSID", "WIFI_PASSWORD", "COLLECTOR_HOST", "COLLECTOR_PORT"] {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}
