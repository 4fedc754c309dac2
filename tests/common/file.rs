use derive_new::new;
use std::fs::File;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file_spec: FileSpec) {
    // make sure the parent directory exists
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create directory {:?}: {}", parent, e));
    }

    std::fs::write(&file_spec.path, &file_spec.content)
        .unwrap_or_else(|e| panic!("Failed to write file {:?}: {}", file_spec.path, e));
}

pub fn make_executable(path: &Path) {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .unwrap_or_else(|e| panic!("Failed to chmod {:?}: {}", path, e));
}

/// Files with random names and content, named relative to `dir`
pub fn write_generated_files(dir: &Path, files_count: usize) -> Vec<(String, String)> {
    use fake::{
        Fake,
        faker::lorem::en::{Word, Words},
    };

    let mut files = std::collections::BTreeMap::new();
    while files.len() < files_count {
        let file_name = format!("{}.txt", Word().fake::<String>());
        let file_content = Words(5..10).fake::<Vec<String>>().join(" ");
        files.insert(file_name, file_content);
    }

    for (file_name, file_content) in &files {
        write_file(FileSpec::new(dir.join(file_name), file_content.clone()));
    }

    files.into_iter().collect()
}

/// Tar archive of `(name, mode, content)` regular files
pub fn write_tar(path: &Path, files: &[(&str, u32, &str)]) {
    let mut builder = tar::Builder::new(File::create(path).expect("Failed to create tar"));

    for (name, mode, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(*mode);
        header.set_size(content.len() as u64);
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap_or_else(|e| panic!("Failed to append {name}: {e}"));
    }

    builder.into_inner().expect("Failed to finish tar");
}

/// Zip archive of `(name, content)` files
pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut writer = zip::ZipWriter::new(File::create(path).expect("Failed to create zip"));
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in files {
        writer
            .start_file(*name, options)
            .unwrap_or_else(|e| panic!("Failed to add {name}: {e}"));
        writer
            .write_all(content.as_bytes())
            .unwrap_or_else(|e| panic!("Failed to write {name}: {e}"));
    }

    writer.finish().expect("Failed to finish zip");
}
