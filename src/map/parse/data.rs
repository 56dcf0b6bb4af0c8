//! Decoding of `<data>` elements into cells.
use std::io::Read;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::read::{GzDecoder, ZlibDecoder};
use glam::IVec2;
use roxmltree::Node;
use crate::HashMap;
use crate::map::{Chunk, FiniteTileLayer, Gid, InfiniteTileLayer, TileLayerKind, TmxError, TmxResult};
use super::attr::{attr_parse, attr_parse_or, children};

/// Decodes the cells of a tile layer.
/// Layers whose data is split into `<chunk>`s become infinite layers.
pub(crate) fn parse_data(data_node: Node, width: u32, height: u32, max_chunk_cells: u32) -> TmxResult<TileLayerKind> {
    let encoding = data_node.attribute("encoding");
    let compression = data_node.attribute("compression");
    if children(data_node, "chunk").next().is_some() {
        let layer = parse_chunks(data_node, encoding, compression, max_chunk_cells)?;
        return Ok(TileLayerKind::InfiniteTileLayer(layer));
    }
    let cells = width as usize * height as usize;
    let tiles = decode_cells(data_node, encoding, compression, cells)?;
    Ok(TileLayerKind::FiniteTileLayer(FiniteTileLayer(tiles)))
}

fn parse_chunks(
    data_node: Node,
    encoding: Option<&str>,
    compression: Option<&str>,
    max_chunk_cells: u32,
) -> TmxResult<InfiniteTileLayer> {
    let mut chunk_size: Option<(u32, u32)> = None;
    let mut chunks = HashMap::default();
    for chunk_node in children(data_node, "chunk") {
        let x: i32 = attr_parse(chunk_node, "x")?;
        let y: i32 = attr_parse(chunk_node, "y")?;
        let width: u32 = attr_parse(chunk_node, "width")?;
        let height: u32 = attr_parse(chunk_node, "height")?;
        let cells = width as u64 * height as u64;
        if width == 0 || height == 0 || cells > max_chunk_cells as u64 {
            return Err(TmxError::malformed(format!("Chunk at ({x}, {y}) has unsupported size {width}x{height}")));
        }

        // Lookups assume every chunk sits on one grid
        let (chunk_width, chunk_height) = *chunk_size.get_or_insert((width, height));
        let aligned = x.rem_euclid(chunk_width as i32) == 0 && y.rem_euclid(chunk_height as i32) == 0;
        if (width, height) != (chunk_width, chunk_height) || !aligned {
            return Err(TmxError::malformed(format!(
                "Chunk at ({x}, {y}) does not fit the {chunk_width}x{chunk_height} chunk grid"
            )));
        }

        let tiles = decode_cells(chunk_node, encoding, compression, cells as usize)?;
        log::trace!("Decoded chunk at ({x}, {y})");
        let origin = IVec2::new(x, y);
        if chunks.insert(origin, Chunk { origin, width, height, tiles }).is_some() {
            return Err(TmxError::malformed(format!("Duplicate chunk at ({x}, {y})")));
        }
    }
    let (chunk_width, chunk_height) = chunk_size.unwrap_or((16, 16));
    Ok(InfiniteTileLayer { chunk_width, chunk_height, chunks })
}

/// Decodes the cells held by a `<data>` or `<chunk>` element.
fn decode_cells(
    node: Node,
    encoding: Option<&str>,
    compression: Option<&str>,
    expected: usize,
) -> TmxResult<Vec<Gid>> {
    let tiles = match encoding {
        None => decode_xml(node)?,
        Some("csv") => decode_csv(node.text().unwrap_or(""))?,
        Some("base64") => {
            let bytes = decode_base64(node.text().unwrap_or(""))?;
            let bytes = decompress(bytes, compression)?;
            decode_bytes(&bytes)?
        },
        Some(encoding) => return Err(TmxError::UnsupportedEncoding { encoding: String::from(encoding) }),
    };
    if tiles.len() != expected {
        return Err(TmxError::malformed(format!("Expected {expected} cells, found {}", tiles.len())));
    }
    Ok(tiles)
}

/// Legacy form with one `<tile gid>` element per cell.
fn decode_xml(node: Node) -> TmxResult<Vec<Gid>> {
    children(node, "tile")
        .map(|tile_node| attr_parse_or(tile_node, "gid", 0).map(Gid))
        .collect()
}

fn decode_csv(text: &str) -> TmxResult<Vec<Gid>> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token
            .parse::<u32>()
            .map(Gid)
            .map_err(|_| TmxError::malformed(format!("Invalid cell '{token}' in csv data")))
        )
        .collect()
}

fn decode_base64(text: &str) -> TmxResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|err| TmxError::malformed(format!("Invalid base64 data: {err}")))
}

fn decompress(bytes: Vec<u8>, compression: Option<&str>) -> TmxResult<Vec<u8>> {
    let mut out = Vec::new();
    let result = match compression {
        None | Some("") => return Ok(bytes),
        Some("zlib") => ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut out),
        Some("gzip") => GzDecoder::new(bytes.as_slice()).read_to_end(&mut out),
        #[cfg(feature = "zstd")]
        Some("zstd") => zstd::stream::read::Decoder::new(bytes.as_slice())
            .and_then(|mut decoder| decoder.read_to_end(&mut out)),
        Some(compression) => return Err(TmxError::UnsupportedEncoding { encoding: String::from(compression) }),
    };
    match result {
        Ok(_) => Ok(out),
        Err(err) => Err(TmxError::malformed(format!("Failed to decompress tile data: {err}"))),
    }
}

/// Groups bytes into little-endian 32 bit cells.
fn decode_bytes(bytes: &[u8]) -> TmxResult<Vec<Gid>> {
    if bytes.len() % 4 != 0 {
        return Err(TmxError::malformed(format!("Tile data of {} bytes is not a whole number of cells", bytes.len())));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| Gid(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
        .collect())
}
