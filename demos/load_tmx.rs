use tmx_map::LoadOptions;
use tmx_map::map::{LayerKind, TmxLoader};

fn main() {
    env_logger::init();
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: load_tmx <map.tmx> [options.yaml]");
        std::process::exit(2);
    };
    let options = match std::env::args().nth(2) {
        Some(options_path) => {
            let text = std::fs::read_to_string(&options_path).unwrap_or_else(|err| {
                eprintln!("Failed to read {options_path}: {err}");
                std::process::exit(1);
            });
            LoadOptions::from_yaml(&text).unwrap_or_else(|err| {
                eprintln!("{err}");
                std::process::exit(1);
            })
        },
        None => LoadOptions::default(),
    };

    let loader = TmxLoader::from_files(options);
    let map = match loader.load(&path) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("Failed to load {path}: {err}");
            std::process::exit(1);
        },
    };

    println!(
        "{:?} map, {}x{} tiles of {}x{} pixels",
        map.orientation, map.width, map.height, map.tile_width, map.tile_height,
    );
    for (i, tileset) in map.tilesets.iter().enumerate() {
        println!("tileset {i}: '{}' gids {:?}", tileset.name, tileset.gid_range());
    }
    for walked in map.layers_with_offsets() {
        let indent = "  ".repeat(walked.depth);
        let layer = walked.layer;
        let summary = match &layer.kind {
            LayerKind::TileLayer(tiles) => format!("tile layer, {} cells set", tiles.tiles().count()),
            LayerKind::ObjectGroup(group) => format!("object group, {} objects", group.objects.len()),
            LayerKind::ImageLayer(_) => String::from("image layer"),
            LayerKind::GroupLayer(group) => format!("group, {} children", group.len()),
        };
        println!("{indent}'{}': {summary} at offset {}", layer.name, walked.offset);
    }
}
