use cfgtype::Config;

#[derive(Config)]
struct Wrapper<T> {
    value: T,
}

fn main() {}
