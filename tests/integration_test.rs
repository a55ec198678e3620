extern crate ecs150fs;
extern crate env_logger;

use ecs150fs::{format, Error, FileSystem, MemBlockDevice};

fn fresh_fs(data_block_count: u16) -> FileSystem<MemBlockDevice> {
    let mut device = MemBlockDevice::new(data_block_count + 3);
    format(&mut device, data_block_count).expect("format volume");
    FileSystem::mount(device).expect("mount fs")
}

#[test]
fn test_create_delete_cycle() {
    let _ = env_logger::try_init();
    let mut fs = fresh_fs(16);

    fs.create("a.txt").expect("create");
    let entries = fs.ls();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].size, 0);

    fs.delete("a.txt").expect("delete");
    assert_eq!(fs.ls().len(), 0);

    let info = fs.info();
    assert_eq!(info.fat_free_count, 15);
    assert_eq!(info.root_dir_free_count, 128);
}

#[test]
fn test_create_name_too_long_or_empty() {
    let _ = env_logger::try_init();
    let mut fs = fresh_fs(16);

    assert!(matches!(fs.create(""), Err(Error::BadName)));
    assert!(matches!(
        fs.create("0123456789abcdef"),
        Err(Error::BadName)
    ));
}

#[test]
fn test_create_duplicate_and_full_directory() {
    let _ = env_logger::try_init();
    let mut fs = fresh_fs(200);

    fs.create("dup").expect("create");
    assert!(matches!(fs.create("dup"), Err(Error::Exists)));

    for i in 1..128 {
        fs.create(&format!("f{}", i)).expect("create");
    }
    assert!(matches!(fs.create("overflow"), Err(Error::DirFull)));
}

#[test]
fn test_single_block_write_and_read_back() {
    let _ = env_logger::try_init();
    let mut fs = fresh_fs(16);
    fs.create("x").expect("create");
    let fd = fs.open("x").expect("open");

    let written = fs.write(fd, b"hello").expect("write");
    assert_eq!(written, 5);
    assert_eq!(fs.stat(fd).unwrap(), 5);

    fs.lseek(fd, 0).expect("lseek");
    let mut buf = [0u8; 5];
    let read = fs.read(fd, &mut buf).expect("read");
    assert_eq!(read, 5);
    assert_eq!(&buf, b"hello");

    fs.close(fd).expect("close");
}

#[test]
fn test_delete_busy_file_fails() {
    let _ = env_logger::try_init();
    let mut fs = fresh_fs(16);
    fs.create("busy").expect("create");
    let fd = fs.open("busy").expect("open");

    assert!(matches!(fs.delete("busy"), Err(Error::Busy)));

    fs.close(fd).expect("close");
    fs.delete("busy").expect("delete after close");
}

#[test]
fn test_seek_bounds() {
    let _ = env_logger::try_init();
    let mut fs = fresh_fs(16);
    fs.create("s").expect("create");
    let fd = fs.open("s").expect("open");
    fs.write(fd, b"12345").unwrap();

    let size = fs.stat(fd).unwrap();
    fs.lseek(fd, size).expect("seek to EOF is legal");
    assert!(matches!(fs.lseek(fd, size + 1), Err(Error::BadOffset)));
}
