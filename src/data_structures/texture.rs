//! Texture images and their GPU counterparts.
//!
//! [`TextureImage`] is decoded, device independent RGBA8 data for a 2D texture
//! or a six-face cube map. [`Texture`] wraps the wgpu objects created from it,
//! plus the depth buffer used by the forward pass.

use image::{GenericImageView, ImageFormat, load_from_memory_with_format};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    D2,
    Cube,
}

/// Decoded RGBA8 pixels. Cube maps hold six equally sized faces ordered
/// +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub faces: Vec<Vec<u8>>,
}

impl TextureImage {
    /// Decodes an image file. `format` is an optional extension hint such as "png".
    pub fn from_bytes(bytes: &[u8], format: Option<&str>) -> anyhow::Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &image::DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            kind: TextureKind::D2,
            width,
            height,
            faces: vec![img.to_rgba8().into_raw()],
        }
    }

    /// Builds a cube map from six decoded faces.
    pub fn cube(faces: Vec<TextureImage>) -> anyhow::Result<Self> {
        if faces.len() != 6 {
            anyhow::bail!("a cube map needs 6 faces, got {}", faces.len());
        }
        let (width, height) = (faces[0].width, faces[0].height);
        if width != height {
            anyhow::bail!("cube faces must be square, got {}x{}", width, height);
        }
        if let Some((i, face)) = faces
            .iter()
            .enumerate()
            .find(|(_, f)| f.width != width || f.height != height)
        {
            anyhow::bail!(
                "cube face {} is {}x{} but face 0 is {}x{}",
                i,
                face.width,
                face.height,
                width,
                height
            );
        }
        Ok(Self {
            kind: TextureKind::Cube,
            width,
            height,
            faces: faces.into_iter().flat_map(|f| f.faces).collect(),
        })
    }

    /// A single-colour image, used for default bindings.
    pub fn solid(rgba: [u8; 4], kind: TextureKind) -> Self {
        let layers = match kind {
            TextureKind::D2 => 1,
            TextureKind::Cube => 6,
        };
        Self {
            kind,
            width: 1,
            height: 1,
            faces: vec![rgba.to_vec(); layers],
        }
    }

    pub fn layer_count(&self) -> u32 {
        self.faces.len() as u32
    }
}

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
    pub kind: TextureKind,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
            kind: TextureKind::D2,
        }
    }

    /// Uploads a decoded image. Cube images become a six-layer texture with a
    /// cube view; colour data is treated as sRGB.
    pub fn from_texture_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        label: Option<&str>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: image.layer_count(),
        };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, pixels) in image.faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size.width),
                    rows_per_image: Some(size.height),
                },
                wgpu::Extent3d {
                    depth_or_array_layers: 1,
                    ..size
                },
            );
        }

        let view = match image.kind {
            TextureKind::D2 => texture.create_view(&wgpu::TextureViewDescriptor::default()),
            TextureKind::Cube => texture.create_view(&wgpu::TextureViewDescriptor {
                label,
                dimension: Some(wgpu::TextureViewDimension::Cube),
                ..Default::default()
            }),
        };
        let sampler = Some(create_default_sampler(device));

        Self {
            texture,
            view,
            sampler,
            kind: image.kind,
        }
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: u32) -> TextureImage {
        TextureImage::from_image(&image::DynamicImage::new_rgba8(size, size))
    }

    #[test]
    fn cube_requires_six_matching_faces() {
        assert!(TextureImage::cube(vec![face(2); 5]).is_err());
        let mut faces = vec![face(2); 6];
        faces[4] = face(4);
        assert!(TextureImage::cube(faces).is_err());

        let cube = TextureImage::cube(vec![face(2); 6]).unwrap();
        assert_eq!(cube.kind, TextureKind::Cube);
        assert_eq!(cube.layer_count(), 6);
        assert_eq!(cube.faces[5].len(), 2 * 2 * 4);
    }

    #[test]
    fn png_bytes_decode_to_rgba() {
        let mut bytes = Vec::new();
        image::DynamicImage::new_rgb8(3, 2)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let decoded = TextureImage::from_bytes(&bytes, Some("png")).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.faces[0].len(), 3 * 2 * 4);
    }
}
