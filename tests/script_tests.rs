use std::io::Write;
use waveshelf::config::Config;
use waveshelf::script::{load_script, run_script};

#[tokio::test(start_paused = true)]
async fn script_file_drives_a_full_session() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"cmd": "seed", "records": [
                {{"id": "", "parent_id": null, "name": "drums", "kind": "folder",
                  "size_bytes": 0, "created_label": "2026-01-01", "url": null}},
                {{"id": "", "parent_id": null, "name": "kick.wav", "kind": "audio",
                  "size_bytes": 4096, "created_label": "2026-01-01", "url": null}},
                {{"id": "", "parent_id": null, "name": "snare.wav", "kind": "audio",
                  "size_bytes": 4096, "created_label": "2026-01-01", "url": null}}
            ]}},
            {{"cmd": "hydrate"}},
            {{"cmd": "grid_click", "id": "asset-1"}},
            {{"cmd": "grid_click", "id": "asset-2", "shift": true}},
            {{"cmd": "drop", "source": "asset-1", "target": "fld-0"}},
            {{"cmd": "snapshot", "what": "grid"}},
            {{"cmd": "open_folder", "id": "fld-0"}},
            {{"cmd": "snapshot", "what": "grid"}}
        ]"#
    )
    .unwrap();

    let commands = load_script(file.path()).unwrap();
    let snapshots = run_script(commands, Config::default()).await.unwrap();
    assert_eq!(snapshots.len(), 2);

    // Root now holds only the folder.
    let root = snapshots[0]["grid"].as_array().unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0]["name"], "drums");

    // Inside the folder: the Up tile plus both moved files.
    let inside = snapshots[1]["grid"].as_array().unwrap();
    assert_eq!(inside.len(), 3);
    assert_eq!(inside[0]["up"], true);
}

#[tokio::test(start_paused = true)]
async fn script_surfaces_batch_errors_in_snapshots() {
    let script = r#"[
        {"cmd": "fail_next", "key": "loop.wav", "error": "Bucket not found"},
        {"cmd": "upload", "files": [
            {"name": "loop.wav", "mime": "audio/wav", "size_bytes": 1024}
        ]},
        {"cmd": "snapshot", "what": "batch"}
    ]"#;
    let commands = serde_json::from_str(script).unwrap();
    let snapshots = run_script(commands, Config::default()).await.unwrap();
    let batch = &snapshots[0]["batch"];
    assert_eq!(batch["errored"], 1);
    assert_eq!(batch["items"][0]["status"], "error");
    assert_eq!(batch["items"][0]["error"], "Bucket Missing");
    assert_eq!(batch["is_active"], true);
}
