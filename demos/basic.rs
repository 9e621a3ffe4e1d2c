use snapmap::SnapMap;

fn main() -> Result<(), snapmap::Error> {
    let path = std::env::temp_dir().join("snapmap_demo_basic.json");
    let db = SnapMap::open(&path)?;

    // set / get / remove
    db.set("apples", 3);
    db.set("bananas", 5);
    println!("apples  = {:?}", db.get("apples"));
    println!("bananas = {:?}", db.get("bananas"));
    db.remove("bananas");
    println!("bananas after remove = {:?}", db.get("bananas"));

    // only the first write for a key lands
    db.set_if_absent("apples", 99);
    db.set_if_absent("cherries", 7);
    println!("apples   after set_if_absent = {:?}", db.get("apples"));
    println!("cherries after set_if_absent = {:?}", db.get("cherries"));

    // values are arbitrary JSON
    db.set("config", serde_json::json!({ "retries": 3, "verbose": true }));

    // bulk insert
    db.extend(vec![
        ("grapes".to_string(), 12.into()),
        ("lemons".to_string(), 7.into()),
    ]);

    // snapshots
    println!("keys  = {:?}", db.keys());
    println!("len   = {}", db.len());
    println!("empty = {}", db.is_empty());

    // persist and clean up
    db.flush()?;
    println!("on disk: {}", std::fs::read_to_string(db.path())?.trim_end());
    db.clear();
    println!("after clear: len = {}", db.len());

    let _ = std::fs::remove_file(&path);
    Ok(())
}
