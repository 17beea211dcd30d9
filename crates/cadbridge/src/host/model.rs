//! In-memory document model: designs, components, sketches, and features.

use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;

use serde::Serialize;
use strum::{Display, EnumString};

use super::HostError;

/// A 2D point in sketch space, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Construction plane a sketch lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SketchPlane {
    /// The XY plane.
    #[default]
    Xy,
    /// The XZ plane.
    Xz,
    /// The YZ plane.
    Yz,
}

/// A curve drawn on a sketch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SketchCurve {
    /// Straight segment.
    Line {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
    },
    /// Full circle.
    Circle {
        /// Centre point.
        center: Point,
        /// Radius in centimetres.
        radius: f64,
    },
    /// Counter-clockwise arc around a centre.
    Arc {
        /// Centre point.
        center: Point,
        /// Start point.
        start: Point,
        /// End point, projected onto the arc's circle.
        end: Point,
        /// Radius in centimetres.
        radius: f64,
    },
}

/// A closed region that can be extruded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Profile {
    /// Number of bounding edges.
    pub edges: usize,
    /// Enclosed area in square centimetres.
    pub area: f64,
}

/// A sketch owned by a component.
#[derive(Debug)]
pub struct Sketch {
    name: String,
    plane: SketchPlane,
    curves: RefCell<Vec<SketchCurve>>,
    profiles: RefCell<Vec<Profile>>,
}

impl Sketch {
    fn new(name: String, plane: SketchPlane) -> Self {
        Self {
            name,
            plane,
            curves: RefCell::new(Vec::new()),
            profiles: RefCell::new(Vec::new()),
        }
    }

    /// Sketch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plane the sketch lies on.
    #[must_use]
    pub const fn plane(&self) -> SketchPlane {
        self.plane
    }

    /// Number of curves drawn so far.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.curves.borrow().len()
    }

    /// Snapshot of the drawn curves.
    #[must_use]
    pub fn curves(&self) -> Vec<SketchCurve> {
        self.curves.borrow().clone()
    }

    /// Number of closed profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.profiles.borrow().len()
    }

    /// Returns the profile at `index`.
    #[must_use]
    pub fn profile(&self, index: usize) -> Option<Profile> {
        self.profiles.borrow().get(index).copied()
    }

    /// Adds a line between two points.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidGeometry`] for a zero-length line.
    pub fn add_line(&self, start: Point, end: Point) -> Result<(), HostError> {
        if start == end {
            return Err(HostError::InvalidGeometry(
                "line endpoints must differ".to_owned(),
            ));
        }
        self.curves.borrow_mut().push(SketchCurve::Line { start, end });
        Ok(())
    }

    /// Adds a circle, which also closes a new profile.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidGeometry`] for a non-positive radius.
    pub fn add_circle(&self, center: Point, radius: f64) -> Result<(), HostError> {
        if radius.is_nan() || radius <= 0.0 {
            return Err(HostError::InvalidGeometry(
                "radius must be positive".to_owned(),
            ));
        }
        self.curves
            .borrow_mut()
            .push(SketchCurve::Circle { center, radius });
        self.profiles.borrow_mut().push(Profile {
            edges: 1,
            area: PI * radius * radius,
        });
        Ok(())
    }

    /// Adds an axis-aligned rectangle as four lines and one profile.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidGeometry`] when either side is zero.
    pub fn add_rectangle(&self, corner: Point, width: f64, height: f64) -> Result<(), HostError> {
        if width == 0.0 || height == 0.0 {
            return Err(HostError::InvalidGeometry(
                "rectangle sides must be non-zero".to_owned(),
            ));
        }
        let corners = [
            corner,
            Point::new(corner.x + width, corner.y),
            Point::new(corner.x + width, corner.y + height),
            Point::new(corner.x, corner.y + height),
        ];
        let ends = corners.iter().cycle().skip(1);
        self.curves.borrow_mut().extend(
            corners
                .iter()
                .zip(ends)
                .map(|(start, end)| SketchCurve::Line {
                    start: *start,
                    end: *end,
                }),
        );
        self.profiles.borrow_mut().push(Profile {
            edges: 4,
            area: (width * height).abs(),
        });
        Ok(())
    }

    /// Adds an arc from `start` around `center`, ending on the ray towards
    /// `end`. Returns the radius.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidGeometry`] when the start point sits on
    /// the centre.
    pub fn add_arc(&self, center: Point, start: Point, end: Point) -> Result<f64, HostError> {
        let radius = center.distance_to(start);
        if radius == 0.0 {
            return Err(HostError::InvalidGeometry(
                "arc start must differ from its centre".to_owned(),
            ));
        }
        let angle = (end.y - center.y).atan2(end.x - center.x);
        let projected = Point::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        );
        self.curves.borrow_mut().push(SketchCurve::Arc {
            center,
            start,
            end: projected,
            radius,
        });
        Ok(radius)
    }
}

/// Ordered sketches of one component. Cloning shares the collection.
#[derive(Debug, Clone, Default)]
pub struct SketchCollection(Rc<RefCell<Vec<Rc<Sketch>>>>);

impl SketchCollection {
    /// Number of sketches.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }

    /// Sketch at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<Rc<Sketch>> {
        self.0.borrow().get(index).cloned()
    }

    /// Snapshot of the sketches in creation order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Rc<Sketch>> {
        self.0.borrow().clone()
    }

    /// Creates a sketch on `plane`, named after its position.
    #[must_use]
    pub fn add(&self, plane: SketchPlane) -> Rc<Sketch> {
        let mut sketches = self.0.borrow_mut();
        let sketch = Rc::new(Sketch::new(format!("Sketch{}", sketches.len() + 1), plane));
        sketches.push(Rc::clone(&sketch));
        sketch
    }
}

/// How an extrude combines with existing bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FeatureOperation {
    /// Create a new body.
    #[strum(serialize = "new")]
    #[serde(rename = "new")]
    NewBody,
    /// Merge into an existing body.
    #[strum(serialize = "join")]
    Join,
    /// Subtract from an existing body.
    #[strum(serialize = "cut")]
    Cut,
    /// Keep the overlap with an existing body.
    #[strum(serialize = "intersect")]
    Intersect,
}

/// A solid body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Body {
    /// Body name.
    pub name: String,
    /// Face count.
    pub faces: usize,
}

/// A recorded extrude feature.
#[derive(Debug)]
pub struct ExtrudeFeature {
    name: String,
    sketch: String,
    profile_index: usize,
    distance: f64,
    operation: FeatureOperation,
    suppressed: Cell<bool>,
}

impl ExtrudeFeature {
    /// Feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature type label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        "Extrude"
    }

    /// Name of the source sketch.
    #[must_use]
    pub fn sketch(&self) -> &str {
        &self.sketch
    }

    /// Index of the extruded profile within its sketch.
    #[must_use]
    pub const fn profile_index(&self) -> usize {
        self.profile_index
    }

    /// Extrude distance in centimetres.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Combine operation.
    #[must_use]
    pub const fn operation(&self) -> FeatureOperation {
        self.operation
    }

    /// Whether the feature is suppressed in the timeline.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get()
    }

    /// Suppresses or restores the feature.
    pub fn set_suppressed(&self, suppressed: bool) {
        self.suppressed.set(suppressed);
    }
}

/// Extrude features of one component. Cloning shares the collection.
#[derive(Debug, Clone)]
pub struct ExtrudeFeatureCollection {
    component: String,
    features: Rc<RefCell<Vec<Rc<ExtrudeFeature>>>>,
    bodies: Rc<RefCell<Vec<Body>>>,
}

impl ExtrudeFeatureCollection {
    /// Number of extrude features.
    #[must_use]
    pub fn count(&self) -> usize {
        self.features.borrow().len()
    }

    /// Snapshot of the features in timeline order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Rc<ExtrudeFeature>> {
        self.features.borrow().clone()
    }

    /// Extrudes a sketch profile by `distance` centimetres.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidProfile`] for an out-of-range profile,
    /// [`HostError::InvalidGeometry`] for a zero distance, and
    /// [`HostError::NoTargetBody`] when a combining operation has nothing to
    /// combine with.
    pub fn add(
        &self,
        sketch: &Sketch,
        profile_index: i64,
        distance: f64,
        operation: FeatureOperation,
    ) -> Result<Rc<ExtrudeFeature>, HostError> {
        let invalid_profile = || HostError::InvalidProfile {
            index: profile_index,
            count: sketch.profile_count(),
        };
        let index = usize::try_from(profile_index).map_err(|_| invalid_profile())?;
        let profile = sketch.profile(index).ok_or_else(invalid_profile)?;
        if distance == 0.0 {
            return Err(HostError::InvalidGeometry(
                "extrude distance must be non-zero".to_owned(),
            ));
        }

        let mut bodies = self.bodies.borrow_mut();
        match operation {
            FeatureOperation::NewBody => {
                let name = format!("Body{}", bodies.len() + 1);
                bodies.push(Body {
                    name,
                    faces: profile.edges + 2,
                });
            }
            FeatureOperation::Join | FeatureOperation::Cut | FeatureOperation::Intersect => {
                if bodies.is_empty() {
                    return Err(HostError::NoTargetBody {
                        operation,
                        component: self.component.clone(),
                    });
                }
            }
        }

        let mut features = self.features.borrow_mut();
        let name = format!("Extrude{}", features.len() + 1);
        let feature = Rc::new(ExtrudeFeature {
            name,
            sketch: sketch.name().to_owned(),
            profile_index: index,
            distance,
            operation,
            suppressed: Cell::new(false),
        });
        features.push(Rc::clone(&feature));
        Ok(feature)
    }
}

/// A component in the design hierarchy.
#[derive(Debug)]
pub struct Component {
    name: String,
    sketches: SketchCollection,
    extrudes: ExtrudeFeatureCollection,
    bodies: Rc<RefCell<Vec<Body>>>,
    occurrences: RefCell<Vec<Rc<Component>>>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        let name = name.into();
        let bodies = Rc::new(RefCell::new(Vec::new()));
        Rc::new(Self {
            extrudes: ExtrudeFeatureCollection {
                component: name.clone(),
                features: Rc::default(),
                bodies: Rc::clone(&bodies),
            },
            name,
            sketches: SketchCollection::default(),
            bodies,
            occurrences: RefCell::new(Vec::new()),
        })
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sketches owned by this component.
    #[must_use]
    pub fn sketches(&self) -> SketchCollection {
        self.sketches.clone()
    }

    /// Extrude features owned by this component.
    #[must_use]
    pub fn extrude_features(&self) -> ExtrudeFeatureCollection {
        self.extrudes.clone()
    }

    /// Snapshot of the component's bodies.
    #[must_use]
    pub fn bodies(&self) -> Vec<Body> {
        self.bodies.borrow().clone()
    }

    /// Places `child` as an occurrence beneath this component.
    pub fn add_occurrence(&self, child: Rc<Self>) {
        self.occurrences.borrow_mut().push(child);
    }

    /// Direct child components.
    #[must_use]
    pub fn occurrences(&self) -> Vec<Rc<Self>> {
        self.occurrences.borrow().clone()
    }
}

/// A named user parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserParameter {
    /// Parameter name.
    pub name: String,
    /// Expression as entered, for example `"10 mm"`.
    pub expression: String,
    /// Numeric value when the expression starts with a number.
    pub value: Option<f64>,
    /// Unit label.
    pub unit: String,
    /// Free-form comment.
    pub comment: String,
}

/// Whether `set_user_parameter` created or updated a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterChange {
    /// A new parameter was added.
    Created,
    /// An existing parameter received a new expression.
    Updated,
}

/// An open design document.
#[derive(Debug)]
pub struct Design {
    name: String,
    root: Rc<Component>,
    user_parameters: RefCell<Vec<UserParameter>>,
}

impl Design {
    /// Creates a design with an empty root component of the same name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        let name = name.into();
        Rc::new(Self {
            root: Component::new(name.clone()),
            name,
            user_parameters: RefCell::new(Vec::new()),
        })
    }

    /// Document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root of the component hierarchy.
    #[must_use]
    pub fn root_component(&self) -> Rc<Component> {
        Rc::clone(&self.root)
    }

    /// Root component followed by every nested component, depth first.
    #[must_use]
    pub fn all_components(&self) -> Vec<Rc<Component>> {
        let mut components = Vec::new();
        let mut pending = vec![Rc::clone(&self.root)];
        while let Some(component) = pending.pop() {
            pending.extend(component.occurrences().into_iter().rev());
            components.push(component);
        }
        components
    }

    /// Every sketch in the hierarchy with its owning component, in the
    /// order used for global sketch indices.
    #[must_use]
    pub fn all_sketches(&self) -> Vec<(Rc<Component>, Rc<Sketch>)> {
        self.all_components()
            .into_iter()
            .flat_map(|component| {
                component
                    .sketches()
                    .to_vec()
                    .into_iter()
                    .map(move |sketch| (Rc::clone(&component), sketch))
            })
            .collect()
    }

    /// Snapshot of the user parameters.
    #[must_use]
    pub fn user_parameters(&self) -> Vec<UserParameter> {
        self.user_parameters.borrow().clone()
    }

    /// Creates or updates a user parameter from a value and unit.
    #[must_use]
    pub fn set_user_parameter(&self, name: &str, value: &str, unit: &str) -> ParameterChange {
        let expression = format!("{value} {unit}");
        let numeric = value.trim().parse::<f64>().ok();
        let mut parameters = self.user_parameters.borrow_mut();
        if let Some(existing) = parameters.iter_mut().find(|param| param.name == name) {
            existing.expression = expression;
            existing.value = numeric;
            existing.unit = unit.to_owned();
            return ParameterChange::Updated;
        }
        parameters.push(UserParameter {
            name: name.to_owned(),
            expression,
            value: numeric,
            unit: unit.to_owned(),
            comment: String::new(),
        });
        ParameterChange::Created
    }
}
