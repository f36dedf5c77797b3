#![allow(dead_code)]

pub fn write_config(base_url: &str, extra: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().expect("temp config file");
    let yaml = format!(
        "gitUrl: \"{base_url}/\"\nprojectId: 7\nbranch: main\ngitToken: secret-token\nfileName: \"/pictures/{{fileName}}\"\nauthorMail: dev@example.com\nauthorName: dev\n{extra}"
    );
    std::fs::write(file.path(), yaml).expect("write temp config");
    file
}
