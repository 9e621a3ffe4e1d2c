use snapmap::SnapMap;
use std::time::Duration;

fn main() -> Result<(), snapmap::Error> {
    tracing_subscriber::fmt::init();

    let path = std::env::temp_dir().join("snapmap_demo_sync.json");
    let (mut db, errors) = SnapMap::open_with_sync(&path, Duration::from_millis(500))?;

    db.set("status", "warming up");
    println!("waiting for the background thread to write...");
    std::thread::sleep(Duration::from_millis(700));
    println!("on disk: {}", std::fs::read_to_string(db.path())?.trim_end());

    db.set("status", "running");
    db.set("uptime_secs", 1);
    std::thread::sleep(Duration::from_millis(700));
    println!("on disk: {}", std::fs::read_to_string(db.path())?.trim_end());

    // flush errors from the background thread land here
    for err in errors.try_iter() {
        eprintln!("sync error: {err}");
    }

    db.stop_sync();
    println!("sync running after stop: {}", db.sync_running());

    // stop does not flush for you; write the final state explicitly
    db.set("status", "stopped");
    db.flush()?;
    println!("final: {}", std::fs::read_to_string(db.path())?.trim_end());

    let _ = std::fs::remove_file(&path);
    Ok(())
}
