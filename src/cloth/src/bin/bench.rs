use std::sync::atomic::AtomicBool;
use std::time::SystemTime;

use cloth::mesh::ClothMesh;
use cloth::params::SimParams;
use cloth::world::ClothWorld;
use scene::static_scene::StaticScene;
use scene::surface::TriSurface;

fn main() {
	let start = SystemTime::now();
	let side = 25;
	let surface = TriSurface::grid(side, side, 0.2, 1.0);
	let mut cloth = ClothMesh::from_surface(surface, 0.5).unwrap();
	let mut pins = vec![false; side * side];
	for pin in pins.iter_mut().take(side) {
		*pin = true;
	}
	cloth.set_pinned(&pins);
	let params = SimParams::default().with_gravity(-9.8).with_frames(0, 30);
	let mut world = ClothWorld::new(cloth, Box::new(StaticScene::default()))
		.with_params(params);
	let cancel = AtomicBool::new(false);
	world.run(&cancel);
	let simulated = (world.params().sim_frames as f32 + 1.0) / world.params().fps as f32;
	let duration = SystemTime::now().duration_since(start).unwrap().as_micros();
	eprintln!("{:.3}%", duration as f32 / simulated / 1e4);
}
