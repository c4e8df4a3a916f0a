use std::sync::Arc;

use anyhow::Result;
use bucketfs::{BucketDriver, DriverConfig, FolderRole, MemoryBucket, recycler_candidates, role_of};

fn driver_over(bucket: &MemoryBucket) -> BucketDriver {
    BucketDriver::new(Arc::new(bucket.clone()), DriverConfig::default())
}

#[test]
fn test_roles_come_from_the_basename() {
    assert_eq!(role_of("a/b/_recycler_/"), FolderRole::Recycler);
    assert_eq!(role_of("_recycler_"), FolderRole::Recycler);
    assert_eq!(role_of("a/_temp_/"), FolderRole::Temporary);
    assert_eq!(role_of("user_upload/"), FolderRole::UserUpload);
    assert_eq!(role_of("a/b/"), FolderRole::Default);
    assert_eq!(role_of("a/_recycler_/b/"), FolderRole::Default);
}

#[test]
fn test_recycler_candidates_run_deepest_first() {
    assert_eq!(
        recycler_candidates("dir/subdir/"),
        [
            "dir/subdir/_recycler_/",
            "dir/_recycler_/",
            "_recycler_/"
        ]
    );
    // A file's deepest candidate sits beside it, not inside it.
    assert_eq!(
        recycler_candidates("dir/subdir/testfile.txt"),
        [
            "dir/subdir/_recycler_/",
            "dir/_recycler_/",
            "_recycler_/"
        ]
    );
    assert_eq!(recycler_candidates("file.txt"), ["_recycler_/"]);
    assert_eq!(recycler_candidates(""), ["_recycler_/"]);
}

#[tokio::test]
async fn test_folder_moves_into_the_nearest_recycler() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket.insert_object("_recycler_/", b"", None, 0, 0).await;
    bucket
        .insert_object("projects/_recycler_/", b"", None, 0, 0)
        .await;
    bucket.insert_object("projects/alpha/", b"", None, 0, 0).await;
    bucket
        .insert_object("projects/alpha/doc.txt", b"d", None, 0, 0)
        .await;
    let driver = driver_over(&bucket);

    // Recycling happens even without the recursive flag.
    assert!(driver.delete_folder("/projects/alpha/", false).await?);

    assert!(!bucket.contains("projects/alpha/doc.txt").await);
    assert!(!bucket.contains("projects/alpha/").await);
    assert!(bucket.contains("projects/_recycler_/alpha/").await);
    assert!(bucket.contains("projects/_recycler_/alpha/doc.txt").await);
    // The nearer bin won; the root one stayed untouched.
    assert!(!driver.folder_exists("/_recycler_/alpha/").await?);
    Ok(())
}

#[tokio::test]
async fn test_occupied_recycler_slot_gets_a_timestamp_prefix() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket
        .insert_object("projects/_recycler_/alpha/", b"", None, 0, 0)
        .await;
    bucket
        .insert_object("projects/alpha/doc.txt", b"d", None, 0, 0)
        .await;
    let driver = driver_over(&bucket);

    assert!(driver.delete_folder("/projects/alpha/", true).await?);
    assert!(!bucket.contains("projects/alpha/doc.txt").await);

    let folders = driver
        .get_folders_in_folder("/projects/_recycler_/", 0, 0, false, &[], "", false)
        .await?;
    assert_eq!(folders.len(), 2);
    let stamped = folders
        .iter()
        .find(|folder| folder.as_str() != "/projects/_recycler_/alpha/")
        .expect("relocated folder");

    // The collision name is "<stamp>_<basename>" with a 20-digit stamp.
    let base = stamped
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .expect("basename");
    let (stamp, rest) = base.split_at(20);
    assert_eq!(rest, "_alpha");
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));

    assert!(driver.file_exists(&format!("{stamped}doc.txt")).await?);
    Ok(())
}

#[tokio::test]
async fn test_deleting_a_recycler_is_always_hard() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket.insert_object("_recycler_/", b"", None, 0, 0).await;
    bucket
        .insert_object("projects/_recycler_/", b"", None, 0, 0)
        .await;
    bucket
        .insert_object("projects/_recycler_/junk.txt", b"j", None, 0, 0)
        .await;
    let driver = driver_over(&bucket);

    assert!(driver.delete_folder("/projects/_recycler_/", true).await?);
    assert!(!bucket.contains("projects/_recycler_/junk.txt").await);
    assert!(!bucket.contains("projects/_recycler_/").await);
    // Nothing was relocated into the root bin.
    assert_eq!(bucket.object_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_folder_inside_a_recycler_is_hard_deleted() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket.insert_object("_recycler_/", b"", None, 0, 0).await;
    bucket
        .insert_object("_recycler_/old/x.txt", b"x", None, 0, 0)
        .await;
    let driver = driver_over(&bucket);

    assert!(driver.delete_folder("/_recycler_/old/", true).await?);
    assert!(!bucket.contains("_recycler_/old/x.txt").await);
    assert_eq!(bucket.object_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_folder_containing_its_own_recycler_is_hard_deleted() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket
        .insert_object("top/_recycler_/stuff.txt", b"s", None, 0, 0)
        .await;
    bucket.insert_object("top/a.txt", b"a", None, 0, 0).await;
    let driver = driver_over(&bucket);

    assert!(driver.delete_folder("/top/", true).await?);
    assert_eq!(bucket.object_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_hard_delete_requires_recursive_or_empty() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket.insert_object("data/file.txt", b"f", None, 0, 0).await;
    let driver = driver_over(&bucket);

    // Non-empty and non-recursive: refused, nothing deleted.
    assert!(!driver.delete_folder("/data/", false).await?);
    assert!(bucket.contains("data/file.txt").await);

    assert!(driver.delete_folder("/data/", true).await?);
    assert_eq!(bucket.object_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_folder_deletes_without_recursive_flag() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket.insert_object("hollow/", b"", None, 0, 0).await;
    let driver = driver_over(&bucket);

    assert!(driver.delete_folder("/hollow/", false).await?);
    assert!(!bucket.contains("hollow/").await);
    Ok(())
}

#[tokio::test]
async fn test_file_deletion_never_recycles() -> Result<()> {
    let bucket = MemoryBucket::new();
    bucket.insert_object("_recycler_/", b"", None, 0, 0).await;
    bucket.insert_object("solo.txt", b"s", None, 0, 0).await;
    let driver = driver_over(&bucket);

    assert!(driver.delete_file("/solo.txt").await?);
    assert!(!bucket.contains("solo.txt").await);
    assert_eq!(bucket.object_count().await, 1);
    Ok(())
}
