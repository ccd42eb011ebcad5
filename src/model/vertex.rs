/// Interleaved vertex as handed to the GPU buffer collaborator.
///
/// `#[repr(C)]` plus `bytemuck` keep the layout stable so a piece's vertex
/// list can be uploaded as one contiguous attribute buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    /// Tangent, positive along the texture X axis.
    pub s_tangent: [f32; 3],
    pub t_tangent: [f32; 3],
    pub tex_coord: [f32; 2],
    pub tex_coord2: [f32; 2],
}
