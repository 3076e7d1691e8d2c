#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    use demo_core::{EventQueue, NativeHost, ViewerApp};
    use eframe::{run_native, NativeOptions};
    use phylo_view::{MemoryHistory, Settings};

    const APP_NAME: &str = "Phylo Viewer";

    env_logger::init();

    // viewer [URL] [SETTINGS_JSON]
    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "/".to_string());
    let settings = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|text| Settings::from_json(&text).map_err(|err| err.to_string()))
        {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("failed to load settings from {path}: {err}");
                std::process::exit(2);
            }
        },
        None => Settings::default(),
    };

    run_native(
        APP_NAME,
        NativeOptions::default(),
        Box::new(move |cc| {
            let events = EventQueue::default();
            let host = NativeHost::new(std::rc::Rc::clone(&events));
            Ok::<Box<dyn eframe::App>, _>(Box::new(ViewerApp::new(
                cc,
                MemoryHistory::new(url),
                host,
                events,
                settings,
            )))
        }),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {}
