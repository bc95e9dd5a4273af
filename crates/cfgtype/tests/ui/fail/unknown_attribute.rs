use cfgtype::Config;

#[derive(Config)]
struct Settings {
    #[config(flatten)]
    name: String,
}

fn main() {}
