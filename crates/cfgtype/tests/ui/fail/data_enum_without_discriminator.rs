use cfgtype::Config;

#[derive(Config)]
enum Source {
    Path(String),
    Inline { text: String },
}

fn main() {}
