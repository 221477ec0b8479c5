//! End-to-end scenarios through the catalog against an on-disk store.

mod common;

use common::{open_temp_store, photo_blob, text_blob};
use filevault::{placeholder_data_uri, BlobStore, Catalog, FileBlob, VaultError};

#[tokio::test]
async fn test_vacation_folder_deletion_moves_photos_to_root() {
    let (_dir, _path, store) = open_temp_store().await;
    let mut catalog = Catalog::new(&store);

    let folder = catalog.create_folder("Vacation").await.unwrap();
    let report = catalog
        .upload_files(
            vec![
                photo_blob("beach.jpg"),
                photo_blob("sunset.jpg"),
                photo_blob("hotel.jpg"),
            ],
            Some(&folder.id),
        )
        .await
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(store.count_files_in_folder(&folder.id).await.unwrap(), 3);

    catalog.delete_folder(&folder.id).await.unwrap();

    assert!(store.get_folder(&folder.id).await.unwrap().is_none());
    let root = store.list_files_by_folder(None).await.unwrap();
    assert_eq!(root.len(), 3);
    assert!(root.iter().all(|f| f.folder_id.is_none()));

    catalog.refresh().await.unwrap();
    assert_eq!(catalog.files_in_folder(None).len(), 3);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let (_dir, path, store) = open_temp_store().await;

    let folder_id = store.put_folder("Docs").await.unwrap();
    let blob = FileBlob::new("report.pdf", "application/pdf", vec![0x25, 0x50, 0x44, 0x46]);
    let file_id = store.put_file(&blob, Some(&folder_id)).await.unwrap();
    store.close().await;

    let store = BlobStore::open(&path).await.unwrap();
    let file = store.get_file(&file_id).await.unwrap().unwrap();
    assert_eq!(file.blob, blob);
    assert_eq!(file.folder_id.as_deref(), Some(folder_id.as_str()));
    assert_eq!(store.get_folder(&folder_id).await.unwrap().unwrap().name, "Docs");
}

#[tokio::test]
async fn test_repeated_move_is_idempotent() {
    let (_dir, _path, store) = open_temp_store().await;
    let mut catalog = Catalog::new(&store);
    let folder = catalog.create_folder("Archive").await.unwrap();
    let report = catalog
        .upload_files(vec![text_blob("a.txt", "a"), text_blob("b.txt", "b")], None)
        .await
        .unwrap();

    catalog.move_files(&report.succeeded, Some(&folder.id)).await.unwrap();
    let first = store.list_files().await.unwrap();
    catalog.move_files(&report.succeeded, Some(&folder.id)).await.unwrap();
    let second = store.list_files().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rename_of_deleted_folder_is_not_found() {
    let (_dir, _path, store) = open_temp_store().await;
    let mut catalog = Catalog::new(&store);
    let folder = catalog.create_folder("Temp").await.unwrap();

    // Deleted behind the catalog's back.
    store.delete_folder(&folder.id).await.unwrap();

    let err = catalog.rename_folder(&folder.id, "Kept").await.unwrap_err();
    assert!(matches!(err, VaultError::NotFound(_)));
    assert!(!err.is_fatal());
    // Snapshot keeps the old name after the failed write.
    assert_eq!(catalog.folder(&folder.id).unwrap().name, "Temp");
}

#[tokio::test]
async fn test_deleting_unknown_file_is_a_noop() {
    let (_dir, _path, store) = open_temp_store().await;
    store.put_file(&text_blob("keep.txt", "k"), None).await.unwrap();

    let mut catalog = Catalog::new(&store);
    catalog.refresh().await.unwrap();
    catalog.delete_file("no-such-id").await.unwrap();

    assert_eq!(store.count_files().await.unwrap(), 1);
    assert_eq!(catalog.files().len(), 1);
}

#[tokio::test]
async fn test_every_file_gets_a_thumbnail() {
    let (_dir, _path, store) = open_temp_store().await;
    let mut catalog = Catalog::new(&store);
    let report = catalog
        .upload_files(
            vec![
                photo_blob("broken.jpg"),
                FileBlob::new("clip.mp4", "video/mp4", vec![1, 2, 3]),
                FileBlob::new("data.bin", "", vec![0; 16]),
                FileBlob::new("empty.json", "application/json", Vec::new()),
            ],
            None,
        )
        .await
        .unwrap();

    for id in &report.succeeded {
        let uri = catalog.thumbnail(id).await.unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"), "{id}");
        assert_ne!(uri, placeholder_data_uri());
    }
}

#[tokio::test]
async fn test_usage_reflects_store_contents() {
    let (_dir, _path, store) = open_temp_store().await;
    let mut catalog = Catalog::new(&store);
    catalog
        .upload_files(
            vec![photo_blob("a.jpg"), text_blob("b.txt", "hello world")],
            None,
        )
        .await
        .unwrap();

    let usage = catalog.usage();
    assert_eq!(usage.total_files, 2);
    assert_eq!(usage.total_size, store.total_size().await.unwrap());
    assert_eq!(usage.by_type.get("image"), Some(&1));
    assert_eq!(usage.by_type.get("text"), Some(&1));
    assert_eq!(usage.recent_uploads, 2);
}
