use cfgtype::Config;

#[derive(Debug, Clone, PartialEq, Config)]
struct Local {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Config)]
struct Remote {
    url: String,
    #[config(default = 3)]
    retries: u32,
}

#[derive(Debug, Clone, PartialEq, Config)]
#[config(discriminator = "kind", rename_all = "snake_case")]
enum Storage {
    /// Files on disk.
    Local(Local),
    #[config(rename = "s3", description = "An object store.")]
    Remote(Remote),
}

#[derive(Debug, Clone, Copy, PartialEq, Config)]
#[config(rename_all = "lowercase")]
enum Mode {
    Fast,
    #[config(rename = "careful")]
    Slow,
}

#[derive(Debug, Clone, Config)]
struct Job {
    storage: Storage,
    fallback: Option<Box<Storage>>,
    mode: Mode,
}

fn main() {}
