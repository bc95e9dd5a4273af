use std::sync::Arc;

use cfgtype::Config;

#[derive(Debug, Clone, Default)]
struct Handle;

#[derive(Debug, Clone, Config)]
struct Runner {
    r#type: String,
    #[config(skip)]
    handle: Handle,
    cache__internal__: Option<Arc<Vec<u8>>>,
}

fn main() {}
