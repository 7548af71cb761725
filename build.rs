fn main() {
    // Only run winres on Windows targets
    #[cfg(target_os = "windows")]
    {
        let mut res = winres::WindowsResource::new();
        if std::path::Path::new("src/icon.ico").exists() {
            res.set_icon("src/icon.ico");
        }
        res.set("ProductName", "VRC OSC Debugger");
        res.set("FileDescription", "VRC OSC Debugger - live avatar parameter table");
        match res.compile() {
            Ok(_) => println!("cargo:warning=winres: resources embedded"),
            Err(e) => println!("cargo:warning=winres failed: {}", e),
        }
    }
}
