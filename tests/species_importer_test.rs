// ==========================================
// SpeciesImporter 集成测试
// ==========================================
// 测试目标: CSV → 校验 → species 表 的完整流程
// ==========================================


use huerto_planner::importer::{ImportError, SpeciesImporter};
use huerto_planner::logging;
use huerto_planner::repository::SpeciesRepository;

const HEADER: &str = "latin_name,english_name,spanish_name,weekly_kg,weekly_area";

#[test]
fn test_import_file_writes_valid_rows() {
    logging::init_test();

    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = SpeciesRepository::new(&db_path).expect("Failed to open repo");

    let csv = format!(
        "{}\n\
         Solanum_lycopersicum,Tomato,Tomate,5,2.0\n\
         Ocimum_basilicum,Basil,Albahaca,2,1.0\n\
         Daucus_carota,Carrot,Zanahoria,-1,0.5\n",
        HEADER
    );
    let file = test_helpers::write_temp_file(".csv", &csv).expect("Failed to write csv");

    let report = SpeciesImporter::import_file(file.path(), &repo).expect("import should succeed");

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.written, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].row, 4);

    assert_eq!(repo.count().unwrap(), 2);
    assert!(repo.find_by_latin_name("Daucus_carota").unwrap().is_none());
}

#[test]
fn test_import_reports_file_line_after_blank_line() {
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = SpeciesRepository::new(&db_path).expect("Failed to open repo");

    let csv = format!(
        "{}\nSolanum_lycopersicum,Tomato,Tomate,5,2.0\n\nOcimum_basilicum,Basil,Albahaca,0,1.0\n",
        HEADER
    );
    let file = test_helpers::write_temp_file(".csv", &csv).expect("Failed to write csv");

    let report = SpeciesImporter::import_file(file.path(), &repo).expect("import should succeed");

    assert_eq!(report.written, 1);
    let rows: Vec<usize> = report.rejected.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![4]);
}

#[test]
fn test_reimport_refreshes_catalog_values() {
    let (_temp_db, db_path) = test_helpers::create_seeded_db().expect("Failed to create test db");
    let repo = SpeciesRepository::new(&db_path).expect("Failed to open repo");

    let csv = format!("{}\nAllium_cepa,Onion,Cebolla,6,1.5\n", HEADER);
    let file = test_helpers::write_temp_file(".csv", &csv).expect("Failed to write csv");

    SpeciesImporter::import_file(file.path(), &repo).expect("import should succeed");

    let onion = repo.find_by_latin_name("Allium_cepa").unwrap().unwrap();
    assert_eq!(onion.params.weekly_kg, 6.0);
    assert_eq!(onion.params.weekly_area, 1.5);
    assert_eq!(repo.count().unwrap(), 3);
}

#[test]
fn test_import_rejects_bad_files() {
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = SpeciesRepository::new(&db_path).expect("Failed to open repo");

    let missing = SpeciesImporter::import_file(std::path::Path::new("/nonexistent/species.csv"), &repo);
    assert!(matches!(missing, Err(ImportError::FileNotFound(_))));

    let wrong_ext = test_helpers::write_temp_file(".xlsx", HEADER).expect("Failed to write file");
    let result = SpeciesImporter::import_file(wrong_ext.path(), &repo);
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));

    let no_area = test_helpers::write_temp_file(
        ".csv",
        "latin_name,english_name,spanish_name,weekly_kg\nA,B,C,1\n",
    )
    .expect("Failed to write csv");
    let result = SpeciesImporter::import_file(no_area.path(), &repo);
    assert!(matches!(result, Err(ImportError::MissingColumn(ref c)) if c == "weekly_area"));

    assert_eq!(repo.count().unwrap(), 0);
}
