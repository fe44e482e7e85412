use std::path::Path;

use serde::Deserialize;

use crate::config::CabinetConfig;
use crate::types::{Duration, PickTask, SkuId, SkuParams};
use crate::utils::prelude::*;

/// One row of the pick-line file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PickLineRecord {
    part_no: String,
    scan_qty: u32,
    shipping_day: u32,
    /// minutes into the shift
    time_of_day: f64,
    cabinet: Option<u32>,
}

/// One row of the SKU parameter file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SkuRecord {
    part_no: String,
    max_pieces: u32,
    reorder_point: u32,
    /// starts full when absent
    initial_pieces: Option<u32>,
}

/// Load pick lines, resolving each cabinet number to a slot distance
pub fn load_pick_tasks(path: &Path, cabinets: &CabinetConfig) -> Result<Vec<PickTask>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut tasks = Vec::new();
    for record in reader.deserialize() {
        let r: PickLineRecord = record?;
        tasks.push(PickTask {
            sku: SkuId(r.part_no),
            quantity: r.scan_qty,
            day: r.shipping_day,
            time_of_day: Duration(r.time_of_day),
            slot_distance: cabinets.distance(r.cabinet),
        });
    }
    info!(n = tasks.len(), path = %path.display(), "loaded pick lines");
    Ok(tasks)
}

pub fn load_sku_params(path: &Path) -> Result<Vec<SkuParams>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut skus = Vec::new();
    for record in reader.deserialize() {
        let r: SkuRecord = record?;
        skus.push(SkuParams {
            sku: SkuId(r.part_no),
            max_pieces: r.max_pieces,
            reorder_point: r.reorder_point,
            initial_pieces: r.initial_pieces.unwrap_or(r.max_pieces),
        });
    }
    info!(n = skus.len(), path = %path.display(), "loaded SKU parameters");
    Ok(skus)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn cabinets() -> CabinetConfig {
        let mut distances = HashMap::new();
        distances.insert("1".to_string(), 4.95);
        CabinetConfig {
            fallback: 5.7,
            distances,
        }
    }

    #[test]
    fn parses_pick_lines_and_resolves_distances() {
        let path = write_temp(
            "picksim_pick_lines.csv",
            "PartNo,ScanQty,ShippingDay,TimeOfDay,Cabinet\n\
             P-100,4,20110901,12.5,1\n\
             P-200,1,20110901,13.0,\n\
             P-300,25,20110902,0.0,99\n",
        );
        let tasks = load_pick_tasks(&path, &cabinets()).unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].sku, SkuId::from("P-100"));
        assert_eq!(tasks[0].slot_distance, 4.95);
        // missing and unmapped cabinets get the fallback distance
        assert_eq!(tasks[1].slot_distance, 5.7);
        assert_eq!(tasks[2].slot_distance, 5.7);
        assert_eq!(tasks[2].quantity, 25);
    }

    #[test]
    fn parses_sku_params_with_optional_initial() {
        let path = write_temp(
            "picksim_sku_params.csv",
            "PartNo,MaxPieces,ReorderPoint,InitialPieces\n\
             P-100,50,10,20\n\
             P-200,30,5,\n",
        );
        let skus = load_sku_params(&path).unwrap();
        assert_eq!(skus[0].initial_pieces, 20);
        assert_eq!(skus[1].initial_pieces, 30);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(load_sku_params(Path::new("definitely/not/here.csv")).is_err());
    }
}
