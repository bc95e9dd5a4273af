use cfgtype::Config;

#[derive(Config)]
struct Pair(i64, i64);

fn main() {}
