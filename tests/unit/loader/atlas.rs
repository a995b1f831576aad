use super::*;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "xfl_player_atlas_{tag}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_sheet(dir: &Path, name: &str, w: u32, h: u32, frames_json: &str) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 0, 0, 255]));
    img.save(dir.join(format!("{name}.png"))).unwrap();
    std::fs::write(
        dir.join(format!("{name}.json")),
        format!(r#"{{"frames":{frames_json},"meta":{{"app":"test"}}}}"#),
    )
    .unwrap();
}

#[test]
fn missing_list_means_no_atlas() {
    let dir = temp_dir("none");
    assert!(Atlas::load(&dir, 0).unwrap().is_none());
}

#[test]
fn sheets_become_layers_and_first_key_wins() {
    let dir = temp_dir("two");
    write_sheet(
        &dir,
        "sheet0",
        64,
        32,
        r#"{"hero.png":{"frame":{"x":0,"y":0,"w":16,"h":8}}}"#,
    );
    write_sheet(
        &dir,
        "sheet1",
        16,
        128,
        r#"{"hero.png":{"frame":{"x":4,"y":4,"w":2,"h":2}},"tree.png":{"frame":{"x":2,"y":6,"w":10,"h":10}}}"#,
    );
    std::fs::write(dir.join(SHEET_LIST_FILE), "sheet0\n\nsheet1\n").unwrap();

    let atlas = Atlas::load(&dir, 0).unwrap().unwrap();
    assert_eq!(atlas.layers().len(), 2);
    assert_eq!(atlas.size(), (64, 128));

    let hero = atlas.frame("hero.png").unwrap();
    assert_eq!(hero.layer, 0);
    assert_eq!(hero.rect, Rect::new(0.0, 0.0, 16.0, 8.0));
    let tree = atlas.frame("tree.png").unwrap();
    assert_eq!(tree.layer, 1);
    assert_eq!(tree.original_size, kurbo::Size::new(10.0, 10.0));
}

#[test]
fn downscale_halves_regions_but_keeps_original_size() {
    let dir = temp_dir("down");
    write_sheet(
        &dir,
        "s",
        64,
        64,
        r#"{"a.png":{"frame":{"x":8,"y":8,"w":16,"h":32}}}"#,
    );
    std::fs::write(dir.join(SHEET_LIST_FILE), "s").unwrap();

    let atlas = Atlas::load(&dir, 1).unwrap().unwrap();
    assert_eq!(atlas.size(), (32, 32));
    let a = atlas.frame("a.png").unwrap();
    assert_eq!(a.rect, Rect::new(4.0, 4.0, 12.0, 20.0));
    assert_eq!(a.original_size, kurbo::Size::new(16.0, 32.0));
    assert_eq!(a.unscale(), kurbo::Vec2::new(2.0, 2.0));

    let rgba = atlas.load_layer_rgba(0).unwrap();
    assert_eq!(rgba.dimensions(), (32, 32));
    assert!(atlas.load_layer_rgba(3).is_err());
}

#[test]
fn region_lookup_tries_name_href_and_file_name() {
    let region = AtlasRegion {
        rect: Rect::new(0.0, 0.0, 1.0, 1.0),
        layer: 0,
        original_size: kurbo::Size::new(1.0, 1.0),
    };
    let mut frames = BTreeMap::new();
    frames.insert("leaf.png".to_owned(), region);
    let atlas = Atlas::from_parts(Vec::new(), frames, 0);

    assert_eq!(atlas.region_for("leaf.png", "x"), Some(region));
    assert_eq!(atlas.region_for("Leaf", "leaf.png"), Some(region));
    assert_eq!(atlas.region_for("Leaf", "art/trees/leaf.png"), Some(region));
    assert_eq!(atlas.region_for("gdexp/leaf.png", "x"), Some(region));
    assert_eq!(atlas.region_for("Leaf", "bark.png"), None);
}

#[test]
fn malformed_sheet_json_is_a_parse_error() {
    let dir = temp_dir("bad");
    let img = image::RgbaImage::new(4, 4);
    img.save(dir.join("s.png")).unwrap();
    std::fs::write(dir.join("s.json"), "{not json").unwrap();
    std::fs::write(dir.join(SHEET_LIST_FILE), "s").unwrap();
    assert!(matches!(Atlas::load(&dir, 0), Err(XflError::Parse(_))));
}
