use crate::bounds::BoundingBox;
use crate::config::ContainerConfig;
use crate::container::Container;
use crate::extract::ExtractedCell;
use crate::wall::{CustomWall, CutResponse, Wall};
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_BOUNDS: &'static str = r#"
export const BOX_ID_LEFT = -1;
export const BOX_ID_RIGHT = -2;
export const BOX_ID_FRONT = -3;
export const BOX_ID_BACK = -4;
export const BOX_ID_BOTTOM = -5;
export const BOX_ID_TOP = -6;
export const WALL_ID_START = -10;
"#;

/// JavaScript-facing Voronoi container.
#[wasm_bindgen]
pub struct VoronoiContext3D {
    inner: Container,
}

#[wasm_bindgen]
impl VoronoiContext3D {
    #[wasm_bindgen(constructor)]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
        periodic_x: bool,
        periodic_y: bool,
        periodic_z: bool,
    ) -> Result<VoronoiContext3D, JsError> {
        let bounds = BoundingBox::new([min_x, min_y, min_z], [max_x, max_y, max_z]);
        let config = ContainerConfig::new(bounds).with_periodic(periodic_x, periodic_y, periodic_z);
        let inner = Container::new(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(VoronoiContext3D { inner })
    }

    #[wasm_bindgen(js_name = addPoint)]
    pub fn add_point(&mut self, id: i32, x: f64, y: f64, z: f64) {
        self.inner.add_point(id, x, y, z);
    }

    #[wasm_bindgen(js_name = addPoints)]
    pub fn add_points(&mut self, ids: &[i32], xs: &[f64], ys: &[f64], zs: &[f64]) -> Result<(), JsError> {
        self.inner.add_points(ids, xs, ys, zs).map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = getAllCells)]
    pub fn get_all_cells(&self) -> Result<Array, JsValue> {
        let result = Array::new();
        for cell in self.inner.all_cells() {
            result.push(&cell_to_js(&cell)?.into());
        }
        Ok(result)
    }

    #[wasm_bindgen(js_name = getCellById)]
    pub fn get_cell_by_id(&self, id: i32) -> Result<Object, JsValue> {
        cell_to_js(&self.inner.cell_by_id(id))
    }

    /// Like `getCellById`, but returns `undefined` when no particle has
    /// `id`. An emptied cell still comes back as an object with volume 0.
    #[wasm_bindgen(js_name = tryCellById)]
    pub fn try_cell_by_id(&self, id: i32) -> Result<JsValue, JsValue> {
        match self.inner.try_cell_by_id(id) {
            Some(cell) => Ok(cell_to_js(&cell)?.into()),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// One Lloyd step. Entry `i` is the new position of particle id `i`.
    #[wasm_bindgen(js_name = relaxVoronoi)]
    pub fn relax_voronoi(&self) -> Result<Array, JsValue> {
        let result = Array::new();
        for p in self.inner.relax() {
            result.push(&point_to_js(&p)?.into());
        }
        Ok(result)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(getter, js_name = particleCount)]
    pub fn particle_count(&self) -> usize {
        self.inner.particle_count()
    }

    #[wasm_bindgen(js_name = addRandomPoints)]
    pub fn add_random_points(&mut self, count: usize, seed: u64) -> usize {
        self.inner.add_random_points(count, seed)
    }

    #[wasm_bindgen(js_name = addPlaneWall)]
    pub fn add_plane_wall(&mut self, nx: f64, ny: f64, nz: f64, offset: f64, id: Option<i32>) -> Result<i32, JsError> {
        self.push_wall(Wall::plane([nx, ny, nz], offset), id)
    }

    #[wasm_bindgen(js_name = addSphereWall)]
    pub fn add_sphere_wall(&mut self, cx: f64, cy: f64, cz: f64, radius: f64, id: Option<i32>) -> Result<i32, JsError> {
        self.push_wall(Wall::sphere([cx, cy, cz], radius), id)
    }

    #[wasm_bindgen(js_name = addCylinderWall)]
    #[allow(clippy::too_many_arguments)]
    pub fn add_cylinder_wall(
        &mut self,
        px: f64,
        py: f64,
        pz: f64,
        ax: f64,
        ay: f64,
        az: f64,
        radius: f64,
        id: Option<i32>,
    ) -> Result<i32, JsError> {
        self.push_wall(Wall::cylinder([px, py, pz], [ax, ay, az], radius), id)
    }

    #[wasm_bindgen(js_name = addConeWall)]
    #[allow(clippy::too_many_arguments)]
    pub fn add_cone_wall(
        &mut self,
        tx: f64,
        ty: f64,
        tz: f64,
        ax: f64,
        ay: f64,
        az: f64,
        half_angle: f64,
        id: Option<i32>,
    ) -> Result<i32, JsError> {
        self.push_wall(Wall::cone([tx, ty, tz], [ax, ay, az], half_angle), id)
    }

    /// Registers a JS object with `point_inside(x, y, z)` and
    /// `cut_cell(x, y, z) -> { cut, nx, ny, nz, d }` methods.
    #[wasm_bindgen(js_name = addCustomWall)]
    pub fn add_custom_wall(&mut self, val: JsValue, id: Option<i32>) -> Result<i32, JsError> {
        self.push_wall(Wall::custom(JsCustomWall { val }), id)
    }

    #[wasm_bindgen(js_name = clearWalls)]
    pub fn clear_walls(&mut self) {
        self.inner.clear_walls();
    }
}

impl VoronoiContext3D {
    fn push_wall(&mut self, wall: Wall, id: Option<i32>) -> Result<i32, JsError> {
        let wall = match id {
            Some(id) => wall.with_id(id),
            None => wall,
        };
        self.inner.add_wall(wall).map_err(|e| JsError::new(&e.to_string()))
    }
}

struct JsCustomWall {
    val: JsValue,
}

// SAFETY: wasm32 without threads runs every call on the thread that owns the
// JS object; containers are never shared across workers.
unsafe impl Send for JsCustomWall {}

impl std::fmt::Debug for JsCustomWall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JsCustomWall")
    }
}

impl JsCustomWall {
    fn call(&self, name: &str, x: f64, y: f64, z: f64) -> Option<JsValue> {
        let func = Reflect::get(&self.val, &name.into()).ok()?.dyn_into::<Function>().ok()?;
        let args = Array::of3(&x.into(), &y.into(), &z.into());
        func.apply(&self.val, &args).ok()
    }
}

impl CustomWall for JsCustomWall {
    fn point_inside(&self, x: f64, y: f64, z: f64) -> bool {
        self.call("point_inside", x, y, z).and_then(|res| res.as_bool()).unwrap_or(false)
    }

    fn cut_cell(&self, x: f64, y: f64, z: f64) -> CutResponse {
        let parse = |res: JsValue| -> Option<CutResponse> {
            if res.is_null() || res.is_undefined() {
                return None;
            }
            let field = |name: &str| Reflect::get(&res, &name.into()).ok();
            if !field("cut")?.as_bool()? {
                return None;
            }
            let nx = field("nx")?.as_f64()?;
            let ny = field("ny")?.as_f64()?;
            let nz = field("nz")?.as_f64()?;
            let d = field("d")?.as_f64()?;
            Some(CutResponse::plane([nx, ny, nz], d))
        };
        self.call("cut_cell", x, y, z).and_then(parse).unwrap_or_else(CutResponse::no_cut)
    }
}

fn point_to_js(p: &[f64; 3]) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"x".into(), &p[0].into())?;
    Reflect::set(&obj, &"y".into(), &p[1].into())?;
    Reflect::set(&obj, &"z".into(), &p[2].into())?;
    Ok(obj)
}

fn cell_to_js(cell: &ExtractedCell) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"id".into(), &cell.id.into())?;
    Reflect::set(&obj, &"position".into(), &point_to_js(&cell.position)?.into())?;
    Reflect::set(&obj, &"volume".into(), &cell.volume.into())?;

    let vertices = Array::new();
    for v in &cell.vertices {
        vertices.push(&point_to_js(v)?.into());
    }
    Reflect::set(&obj, &"vertices".into(), &vertices)?;

    let faces = Array::new();
    for face in &cell.faces {
        let loop_ = Array::new();
        for &i in face {
            loop_.push(&(i as u32).into());
        }
        faces.push(&loop_);
    }
    Reflect::set(&obj, &"faces".into(), &faces)?;

    let edges = Array::new();
    for e in &cell.edges {
        edges.push(&Array::of2(&(e[0] as u32).into(), &(e[1] as u32).into()));
    }
    Reflect::set(&obj, &"edges".into(), &edges)?;

    let neighbors = Array::new();
    for &n in &cell.neighbors {
        neighbors.push(&n.into());
    }
    Reflect::set(&obj, &"neighbors".into(), &neighbors)?;
    Ok(obj)
}
