fn main() {
    // macOS 框架链接（其他平台只构建内存后端）
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") {
        println!("cargo:rustc-link-lib=framework=ApplicationServices");
    }
}
