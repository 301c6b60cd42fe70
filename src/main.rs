mod app;
mod config;
mod rendering;
mod simulation;

fn main() {
    app::run();
}
