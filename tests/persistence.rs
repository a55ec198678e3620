extern crate ecs150fs;
extern crate env_logger;
extern crate tempfile;

use ecs150fs::{format, FileBlockDevice, FileSystem};

// 16 data blocks -> 1 FAT block -> total image size is superblock + FAT +
// root dir + data blocks = 1 + 1 + 1 + 16.
const DATA_BLOCKS: u16 = 16;
const TOTAL_BLOCKS: u16 = DATA_BLOCKS + 3;

#[test]
fn test_remount_preserves_ls_stat_and_contents() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("disk.img");

    {
        let mut device = FileBlockDevice::create(&path, TOTAL_BLOCKS).expect("create image");
        format(&mut device, DATA_BLOCKS).expect("format volume");
    }

    {
        let device = FileBlockDevice::open(&path).expect("open image");
        let mut fs = FileSystem::mount(device).expect("mount fs");
        fs.create("a.txt").expect("create a.txt");
        let fd = fs.open("a.txt").expect("open a.txt");
        fs.write(fd, b"persisted bytes").expect("write");
        fs.close(fd).expect("close");
        fs.umount().expect("umount");
    }

    {
        let device = FileBlockDevice::open(&path).expect("reopen image");
        let mut fs = FileSystem::mount(device).expect("remount fs");

        let entries = fs.ls();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].size, "persisted bytes".len() as u32);

        let fd = fs.open("a.txt").expect("reopen a.txt");
        assert_eq!(fs.stat(fd).unwrap(), "persisted bytes".len() as u32);

        let mut buf = vec![0u8; "persisted bytes".len()];
        fs.read(fd, &mut buf).expect("read back");
        assert_eq!(&buf, b"persisted bytes");

        fs.close(fd).expect("close");
        fs.umount().expect("final umount");
    }
}

#[test]
fn test_create_delete_image_bytes_restored() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("disk.img");

    let mut device = FileBlockDevice::create(&path, TOTAL_BLOCKS).expect("create image");
    format(&mut device, DATA_BLOCKS).expect("format volume");

    let mut fs = FileSystem::mount(device).expect("mount fs");
    fs.create("a.txt").expect("create");
    fs.delete("a.txt").expect("delete");
    assert_eq!(fs.ls().len(), 0);
    fs.umount().expect("umount");
}
