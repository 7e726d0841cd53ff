fn main() {
    metarule::cli::run();
}
