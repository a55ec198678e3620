extern crate ecs150fs;
extern crate env_logger;

use ecs150fs::{format, FileSystem, MemBlockDevice};

// Kept small enough that the FAT itself fits in a single block (2048 cells),
// so the device's total block count is simply DATA_BLOCKS + 3.
const DATA_BLOCKS: u16 = 2000;

#[test]
fn test_format() {
    let _ = env_logger::try_init();
    let mut device = MemBlockDevice::new(DATA_BLOCKS + 3);
    format(&mut device, DATA_BLOCKS).expect("format volume");

    let fs = FileSystem::mount(device).expect("mount fs");
    assert_eq!(fs.ls().len(), 0);

    let info = fs.info();
    assert_eq!(info.data_block_count, DATA_BLOCKS);
    assert_eq!(info.fat_free_count, DATA_BLOCKS - 1);
    assert_eq!(info.root_dir_free_count, 128);
}

#[test]
fn test_format_then_create() {
    let _ = env_logger::try_init();
    let mut device = MemBlockDevice::new(DATA_BLOCKS + 3);
    format(&mut device, DATA_BLOCKS).expect("format volume");

    let mut fs = FileSystem::mount(device).expect("mount fs");
    fs.create("short.txt").expect("create file");

    let entries = fs.ls();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "short.txt");
    assert_eq!(entries[0].size, 0);
}

#[test]
fn test_info_and_ls_reports_match_expected_format() {
    let _ = env_logger::try_init();
    let mut device = MemBlockDevice::new(DATA_BLOCKS + 3);
    format(&mut device, DATA_BLOCKS).expect("format volume");

    let mut fs = FileSystem::mount(device).expect("mount fs");
    let info = fs.info();
    let report = info.to_string();
    assert!(report.starts_with("FS Info:\n"));
    assert!(report.contains(&format!("total_blk_count={}\n", info.total_block_count)));
    assert!(report.contains(&format!("fat_blk_count={}\n", info.fat_block_count)));
    assert!(report.contains(&format!("rdir_blk={}\n", info.root_dir_block)));
    assert!(report.contains(&format!("data_blk={}\n", info.data_block_start)));
    assert!(report.contains(&format!("data_blk_count={}\n", info.data_block_count)));
    assert!(report.contains(&format!(
        "fat_free_ratio={}/{}\n",
        info.fat_free_count, info.data_block_count
    )));
    assert!(report.ends_with(&format!("rdir_free_ratio={}/128", info.root_dir_free_count)));

    assert_eq!(fs.ls_report(), "FS Ls:\n");
    fs.create("short.txt").expect("create file");
    assert_eq!(fs.ls_report(), "FS Ls:\nfile: short.txt, size: 0, data_blk: 65535\n");
}
