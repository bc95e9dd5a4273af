use cfgtype::Config;

#[derive(Config)]
struct Marker;

fn main() {}
