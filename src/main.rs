use refrax::ensemble::Ensemble;
use refrax::settings::{self};

fn main() {
    let settings = settings::load_config().unwrap();
    let mut ensemble = Ensemble::new(settings).unwrap();

    ensemble.solve();
    ensemble.writeup();
}
